use chrono::Datelike;

const THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

/// Years between the Common Era and the Buddhist Era
pub const BUDDHIST_ERA_OFFSET: i32 = 543;

/// `D <month> <BE year>`, e.g. `5 มีนาคม 2567`
pub fn format_thai_date(date: &impl Datelike) -> String {
    format!(
        "{} {} {}",
        date.day(),
        THAI_MONTHS[date.month0() as usize],
        date.year() + BUDDHIST_ERA_OFFSET
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn formats_buddhist_era() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_thai_date(&date), "5 มีนาคม 2567");
    }

    #[test]
    fn works_with_datetimes() {
        let dt = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(format_thai_date(&dt), "31 ธันวาคม 2566");
        let jan = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(format_thai_date(&jan), "1 มกราคม 2568");
    }
}
