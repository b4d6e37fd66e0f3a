// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    millis = { 340, "340ms" },
    exact_second = { 2_000, "2s" },
    second_and_tenths = { 1_250, "1.2s" },
    exact_minute = { 120_000, "2m" },
    minute_and_seconds = { 125_000, "2m 5s" },
    exact_hour = { 3_600_000, "1h" },
    hour_and_minutes = { 3_780_000, "1h 3m" },
    zero = { 0, "0ms" },
)]
fn formats(ms: u64, expected: &str) {
    assert_eq!(format_elapsed_ms(ms), expected);
}
