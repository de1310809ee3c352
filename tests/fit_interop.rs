use chrono::NaiveDate;
use fitparser::profile::MesgNum;
use fitparser::Value;
use planrs::{parse, FitEncoder, Sport};

/// Encoded files must be readable by an independent FIT decoder

const PLAN: &str = "\
**Week 1**
**Monday**
Easy Run: 5km @ 6:00/km
**Tuesday**
**Wednesday**
Tempo Run: 8km @ 4:30/km HR 150-160
**Week 2**
**Saturday**
Long run 18km Zone 2
- Strides 6 x 100m
";

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
}

fn encode(sport: Sport) -> Vec<u8> {
    FitEncoder::new(sport).encode(&parse(PLAN), start()).unwrap()
}

#[test]
fn test_fitparser_reads_all_messages() {
    let bytes = encode(Sport::Running);
    let records = fitparser::from_bytes(&bytes).expect("fitparser should accept the file");

    let file_ids = records.iter().filter(|r| r.kind() == MesgNum::FileId).count();
    let workouts = records.iter().filter(|r| r.kind() == MesgNum::Workout).count();

    assert_eq!(file_ids, 1);
    assert_eq!(workouts, 4);
}

#[test]
fn test_fitparser_sees_workout_names() {
    let bytes = encode(Sport::Cycling);
    let records = fitparser::from_bytes(&bytes).unwrap();

    let names: Vec<String> = records
        .iter()
        .filter(|r| r.kind() == MesgNum::Workout)
        .flat_map(|r| r.fields().iter())
        .filter(|f| f.name() == "wkt_name")
        .filter_map(|f| match f.value() {
            Value::String(name) => Some(name.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(names, vec!["Easy Run", "Tempo Run", "Long run", "Strides"]);
}

#[test]
fn test_fitparser_rejects_corrupted_file() {
    let mut bytes = encode(Sport::Running);
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;

    assert!(fitparser::from_bytes(&bytes).is_err());
}
