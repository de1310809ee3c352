//! FIT workout file encoder
//!
//! Layout of an encoded file:
//!
//! | section               | bytes                     |
//! |-----------------------|---------------------------|
//! | file header           | 14                        |
//! | file_id definition    | 18                        |
//! | file_id data          | 10                        |
//! | workout definition    | 15 per workout            |
//! | workout data          | 22 per workout            |
//! | file CRC              | 2                         |
//!
//! All multi-byte values are little-endian. Every workout repeats its
//! definition message on local message type 1.

use chrono::{DateTime, NaiveDate, Utc};

use super::{ensure_plan_data, flatten_plan, midnight_utc, ExportError};
use crate::models::{DatedWorkout, Sport, TrainingPlan};

/// FIT SDK profile version written into the header
pub const FIT_PROFILE_VERSION: u16 = 2105;

/// FIT epoch (1989-12-31T00:00:00Z) as Unix milliseconds
pub const FIT_EPOCH_MILLIS: i64 = 631_065_600_000;

const HEADER_SIZE: u8 = 14;
const PROTOCOL_VERSION: u8 = 0x10;
/// FIT `file` enum value 4 (activity); 5 would be workout
const FILE_TYPE_ACTIVITY: u8 = 4;
const MANUFACTURER_DEVELOPMENT: u16 = 0xFFFF;
const WORKOUT_CAPABILITIES: u32 = 0x0000_0020;

const MESG_FILE_ID: u16 = 0;
const MESG_WORKOUT: u16 = 26;
const LOCAL_FILE_ID: u8 = 0;
const LOCAL_WORKOUT: u8 = 1;
const DEFINITION_FLAG: u8 = 0x40;

const BASE_ENUM: u8 = 0x00;
const BASE_UINT16: u8 = 0x84;
const BASE_UINT32: u8 = 0x86;
const BASE_UINT32Z: u8 = 0x8C;
const BASE_STRING: u8 = 0x07;

const NAME_FIELD_SIZE: usize = 16;
const MAX_NAME_BYTES: usize = NAME_FIELD_SIZE - 1;

/// (field number, size, base type) of the file_id message
const FILE_ID_FIELDS: [(u8, u8, u8); 4] = [
    (0, 1, BASE_ENUM),   // type
    (1, 2, BASE_UINT16), // manufacturer
    (2, 2, BASE_UINT16), // product
    (4, 4, BASE_UINT32), // time_created
];

/// (field number, size, base type) of the workout message
const WORKOUT_FIELDS: [(u8, u8, u8); 3] = [
    (4, 1, BASE_ENUM),                      // sport
    (5, 4, BASE_UINT32Z),                   // capabilities
    (8, NAME_FIELD_SIZE as u8, BASE_STRING), // wkt_name
];

const fn definition_size(field_count: usize) -> usize {
    6 + 3 * field_count
}

const fn data_size(fields: &[(u8, u8, u8)]) -> usize {
    let mut size = 1;
    let mut i = 0;
    while i < fields.len() {
        size += fields[i].1 as usize;
        i += 1;
    }
    size
}

const FILE_ID_BYTES: usize = definition_size(FILE_ID_FIELDS.len()) + data_size(&FILE_ID_FIELDS);

/// Bytes added per workout record (definition plus data)
pub const WORKOUT_RECORD_BYTES: usize =
    definition_size(WORKOUT_FIELDS.len()) + data_size(&WORKOUT_FIELDS);

/// Size of an encoded file with no workouts
pub const EMPTY_FILE_BYTES: usize = HEADER_SIZE as usize + FILE_ID_BYTES + 2;

/// Exact encoded size for `workouts` records
pub fn encoded_size(workouts: usize) -> Option<usize> {
    workouts
        .checked_mul(WORKOUT_RECORD_BYTES)?
        .checked_add(EMPTY_FILE_BYTES)
}

const fn crc_table() -> [u16; 16] {
    let mut table = [0u16; 16];
    let mut nibble = 0;
    while nibble < 16 {
        let mut crc = nibble as u16;
        let mut bit = 0;
        while bit < 4 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xA001 } else { crc >> 1 };
            bit += 1;
        }
        table[nibble] = crc;
        nibble += 1;
    }
    table
}

/// Nibble lookup table for the FIT CRC-16
pub const CRC_TABLE: [u16; 16] = crc_table();

fn crc_update(crc: u16, byte: u8) -> u16 {
    let mut crc = crc;

    let tmp = CRC_TABLE[usize::from(crc & 0xF)];
    crc = (crc >> 4) & 0x0FFF;
    crc ^= tmp ^ CRC_TABLE[usize::from(byte & 0xF)];

    let tmp = CRC_TABLE[usize::from(crc & 0xF)];
    crc = (crc >> 4) & 0x0FFF;
    crc ^ tmp ^ CRC_TABLE[usize::from((byte >> 4) & 0xF)]
}

/// FIT CRC-16 over `data`, starting from zero
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0, |crc, &byte| crc_update(crc, byte))
}

/// Seconds since the FIT epoch; instants before it clamp to zero
pub fn to_fit_timestamp(instant: DateTime<Utc>) -> u32 {
    let seconds = (instant.timestamp_millis() - FIT_EPOCH_MILLIS) / 1000;
    if seconds < 0 {
        0
    } else {
        u32::try_from(seconds).unwrap_or(u32::MAX)
    }
}

/// Workout name field: at most 15 UTF-8 bytes cut at a char boundary, zero padded
fn name_field(name: &str) -> [u8; NAME_FIELD_SIZE] {
    let mut end = name.len().min(MAX_NAME_BYTES);
    while !name.is_char_boundary(end) {
        end -= 1;
    }

    let mut field = [0u8; NAME_FIELD_SIZE];
    field[..end].copy_from_slice(&name.as_bytes()[..end]);
    field
}

/// Encodes training plans as FIT workout files
#[derive(Debug, Clone)]
pub struct FitEncoder {
    sport: Sport,
    profile_version: u16,
    time_created: Option<DateTime<Utc>>,
}

impl FitEncoder {
    pub fn new(sport: Sport) -> Self {
        FitEncoder {
            sport,
            profile_version: FIT_PROFILE_VERSION,
            time_created: None,
        }
    }

    pub fn with_profile_version(mut self, profile_version: u16) -> Self {
        self.profile_version = profile_version;
        self
    }

    /// Override the file_id creation time (defaults to the plan start at midnight UTC)
    pub fn with_time_created(mut self, time_created: DateTime<Utc>) -> Self {
        self.time_created = Some(time_created);
        self
    }

    /// Encode a plan starting on `start`; weeks are laid out seven days apart
    pub fn encode(&self, plan: &TrainingPlan, start: NaiveDate) -> Result<Vec<u8>, ExportError> {
        ensure_plan_data(plan)?;

        let workouts = flatten_plan(plan, start, self.sport);
        let time_created = self.time_created.unwrap_or_else(|| midnight_utc(start));
        self.encode_workouts(&workouts, time_created)
    }

    /// Encode already dated workouts
    pub fn encode_workouts(
        &self,
        workouts: &[DatedWorkout],
        time_created: DateTime<Utc>,
    ) -> Result<Vec<u8>, ExportError> {
        let total = encoded_size(workouts.len()).ok_or(ExportError::Overflow { size: usize::MAX })?;
        let payload_size = total - HEADER_SIZE as usize - 2;
        let data_size_field =
            u32::try_from(payload_size).map_err(|_| ExportError::Overflow { size: payload_size })?;

        let mut buffer = Vec::with_capacity(total);
        self.write_header(&mut buffer);

        write_definition(&mut buffer, LOCAL_FILE_ID, MESG_FILE_ID, &FILE_ID_FIELDS);
        buffer.push(LOCAL_FILE_ID);
        buffer.push(FILE_TYPE_ACTIVITY);
        buffer.extend_from_slice(&MANUFACTURER_DEVELOPMENT.to_le_bytes());
        buffer.extend_from_slice(&0u16.to_le_bytes());
        buffer.extend_from_slice(&to_fit_timestamp(time_created).to_le_bytes());

        for workout in workouts {
            write_definition(&mut buffer, LOCAL_WORKOUT, MESG_WORKOUT, &WORKOUT_FIELDS);
            buffer.push(LOCAL_WORKOUT);
            buffer.push(workout.sport.fit_code());
            buffer.extend_from_slice(&WORKOUT_CAPABILITIES.to_le_bytes());
            buffer.extend_from_slice(&name_field(&workout.name));
        }

        // Backfill the data size, then seal the header
        buffer[4..8].copy_from_slice(&data_size_field.to_le_bytes());
        let header_crc = crc16(&buffer[..12]);
        buffer[12..14].copy_from_slice(&header_crc.to_le_bytes());

        let file_crc = crc16(&buffer);
        buffer.extend_from_slice(&file_crc.to_le_bytes());

        debug_assert_eq!(buffer.len(), total);
        tracing::debug!(
            workouts = workouts.len(),
            bytes = buffer.len(),
            "Encoded FIT workout file"
        );

        Ok(buffer)
    }

    fn write_header(&self, buffer: &mut Vec<u8>) {
        buffer.push(HEADER_SIZE);
        buffer.push(PROTOCOL_VERSION);
        buffer.extend_from_slice(&self.profile_version.to_le_bytes());
        buffer.extend_from_slice(&0u32.to_le_bytes());
        buffer.extend_from_slice(b".FIT");
        buffer.extend_from_slice(&0u16.to_le_bytes());
    }
}

fn write_definition(buffer: &mut Vec<u8>, local: u8, global: u16, fields: &[(u8, u8, u8)]) {
    buffer.push(DEFINITION_FLAG | local);
    buffer.push(0); // reserved
    buffer.push(0); // little-endian architecture
    buffer.extend_from_slice(&global.to_le_bytes());
    buffer.push(fields.len() as u8);
    for &(number, size, base_type) in fields {
        buffer.extend_from_slice(&[number, size, base_type]);
    }
}
