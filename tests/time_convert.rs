use vigilia::time::{secs_from_timespec, timespec_from_secs};

#[test]
fn test_whole_seconds_convert_exactly() {
    let ts = timespec_from_secs(3.0);

    assert_eq!(ts.tv_sec, 3);
    assert_eq!(ts.tv_nsec, 0);
    assert_eq!(secs_from_timespec(&ts), 3.0);
}

#[test]
fn test_sub_second_part_truncates() {
    // 1.9999999999 seconds holds 999999999.9ns of fraction; truncation
    // keeps it below the next whole second.
    let ts = timespec_from_secs(1.999_999_999_9);

    assert_eq!(ts.tv_sec, 1);
    assert_eq!(ts.tv_nsec, 999_999_999);
}

#[test]
fn test_round_trip_stays_within_one_nanosecond() {
    for secs in [0.0, 0.1, 0.25, 1.5, 2.999_999_999, 123.456, 86_400.001] {
        let ts = timespec_from_secs(secs);
        let back = secs_from_timespec(&ts);

        assert!(
            back <= secs,
            "Truncation never rounds up: {back} > {secs}"
        );
        assert!(
            secs - back <= 1e-9 + f64::EPSILON * secs,
            "Round-trip of {secs} drifted to {back}"
        );
    }
}

#[test]
#[should_panic]
fn test_negative_duration_is_a_contract_violation() {
    timespec_from_secs(-1.0);
}
