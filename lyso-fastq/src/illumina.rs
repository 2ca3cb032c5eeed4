use crate::error::IlluminaNameError;

/// Which surface of the flow cell a tile sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Top,
    Bottom,
}

/// A decoded tile number: surface, swath, and tile-within-swath,
/// packed into Illumina's 4-digit `SWTT` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub surface: Surface,
    pub swath: u8,
    pub number: u8,
}

/// Decodes a 4-digit Illumina tile string (`S` surface, `W` swath, `TT`
/// two-digit tile number).
pub fn tile_of_string(s: &str) -> Result<Tile, IlluminaNameError> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IlluminaNameError::WrongTileFormat(s.to_string()));
    }
    let bytes = s.as_bytes();
    let surface_digit = bytes[0] - b'0';
    let surface = match surface_digit {
        1 => Surface::Top,
        2 => Surface::Bottom,
        _ => return Err(IlluminaNameError::WrongSurface(surface_digit)),
    };
    let swath = bytes[1] - b'0';
    let number: u8 = s[2..4].parse().map_err(|_| IlluminaNameError::WrongTileFormat(s.to_string()))?;
    Ok(Tile { surface, swath, number })
}

/// Encodes a tile back to its 4-digit wire form, the inverse of
/// [`tile_of_string`].
pub fn tile_to_string(tile: &Tile) -> String {
    let surface_digit = match tile.surface {
        Surface::Top => 1,
        Surface::Bottom => 2,
    };
    format!("{surface_digit}{}{:02}", tile.swath, tile.number)
}

/// A fully decoded Casava ≥1.8 Illumina read name, as carried in the
/// `name` field of a [`crate::model::FastqItem`] (the `@` line before
/// `split_name` strips any trailing description).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IlluminaName {
    pub instrument: String,
    pub run_number: i64,
    pub flowcell_id: String,
    pub lane: u32,
    pub tile: Tile,
    pub x_pos: i64,
    pub y_pos: i64,
    pub read: u32,
    pub is_filtered: bool,
    pub control_number: u32,
    pub index: String,
}

fn parse_int(field: &str) -> Result<i64, IlluminaNameError> {
    field.parse().map_err(|_| IlluminaNameError::InvalidInteger(field.to_string()))
}

/// Parses a Casava ≥1.8 read name, treating both `:` and ` ` as field
/// separators (§4.8: "splits on `:` and space"). The 11 fields are, in
/// order: instrument, run_number, flowcell_id, lane, tile, x_pos, y_pos,
/// read, is_filtered, control_number, index.
pub fn parse_illumina_name(name: &str) -> Result<IlluminaName, IlluminaNameError> {
    let fields: Vec<&str> = name.split(|c| c == ':' || c == ' ').collect();
    if fields.len() != 11 {
        return Err(IlluminaNameError::WrongFieldCount(fields.len()));
    }

    let is_filtered = match fields[8] {
        "Y" => true,
        "N" => false,
        other => return Err(IlluminaNameError::WrongIsFiltered(other.to_string())),
    };

    Ok(IlluminaName {
        instrument: fields[0].to_string(),
        run_number: parse_int(fields[1])?,
        flowcell_id: fields[2].to_string(),
        lane: parse_int(fields[3])? as u32,
        tile: tile_of_string(fields[4])?,
        x_pos: parse_int(fields[5])?,
        y_pos: parse_int(fields[6])?,
        read: parse_int(fields[7])? as u32,
        is_filtered,
        control_number: parse_int(fields[9])? as u32,
        index: fields[10].to_string(),
    })
}

/// Renders a name back to its colon/space-separated wire form, the
/// inverse of [`parse_illumina_name`].
pub fn format_illumina_name(name: &IlluminaName) -> String {
    format!(
        "{}:{}:{}:{}:{}:{}:{} {}:{}:{}:{}",
        name.instrument,
        name.run_number,
        name.flowcell_id,
        name.lane,
        tile_to_string(&name.tile),
        name.x_pos,
        name.y_pos,
        name.read,
        if name.is_filtered { "Y" } else { "N" },
        name.control_number,
        name.index,
    )
}
