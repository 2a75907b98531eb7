use chrono::NaiveTime;
use pretty_assertions::assert_eq;
use rstest::rstest;
use schedlite_core::errors::SchedError;
use schedlite_core::time::WallClockTime;

#[rstest]
#[case("09:00", 9, 0, 0)]
#[case("00:00", 0, 0, 0)]
#[case("23:59", 23, 59, 0)]
#[case("13:15:30", 13, 15, 30)]
fn parses_well_formed_times(
    #[case] input: &str,
    #[case] hour: u32,
    #[case] minute: u32,
    #[case] second: u32,
) {
    let time: WallClockTime = input.parse().unwrap();
    assert_eq!(time.as_naive(), NaiveTime::from_hms_opt(hour, minute, second).unwrap());
}

#[rstest]
#[case("")]
#[case("9:00")]
#[case("09:0")]
#[case("24:00")]
#[case("12:60")]
#[case("12:30:60")]
#[case("12")]
#[case("12:30:00:00")]
#[case("ab:cd")]
#[case("+1:30")]
#[case("09:00pm")]
fn rejects_malformed_times(#[case] input: &str) {
    let err = input.parse::<WallClockTime>().unwrap_err();
    assert!(matches!(err, SchedError::Validation(_)));
}

#[test]
fn displays_without_zero_seconds() {
    assert_eq!(WallClockTime::new(9, 5).unwrap().to_string(), "09:05");
    let with_seconds: WallClockTime = "09:05:07".parse().unwrap();
    assert_eq!(with_seconds.to_string(), "09:05:07");
}

#[test]
fn serde_uses_string_form() {
    let time = WallClockTime::new(14, 30).unwrap();
    let json = serde_json::to_string(&time).unwrap();
    assert_eq!(json, "\"14:30\"");
    let back: WallClockTime = serde_json::from_str(&json).unwrap();
    assert_eq!(back, time);
    assert!(serde_json::from_str::<WallClockTime>("\"2pm\"").is_err());
}

#[test]
fn ordering_follows_time_of_day() {
    let morning: WallClockTime = "09:00".parse().unwrap();
    let noon: WallClockTime = "12:00".parse().unwrap();
    assert!(morning < noon);
}
