use chrono::NaiveDate;

/// Situação de um certificado em relação à data de hoje
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
  Valid { days_left: i64 },
  ExpiringSoon { days_left: i64 },
  Expired { days_overdue: i64 },
}

/// Classifica uma validade gravada no cadastro. O certificado vale até o fim
/// do dia de `valid_until`.
pub fn expiry_status(valid_until: NaiveDate, today: NaiveDate, warn_days: u32) -> ExpiryStatus {
  let days_left = (valid_until - today).num_days();
  if days_left < 0 {
    ExpiryStatus::Expired {
      days_overdue: -days_left,
    }
  } else if days_left <= i64::from(warn_days) {
    ExpiryStatus::ExpiringSoon { days_left }
  } else {
    ExpiryStatus::Valid { days_left }
  }
}

/// Lê uma data `YYYY-MM-DD` como as gravadas pela ingestão
pub fn parse_date(value: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(value: &str) -> NaiveDate {
    parse_date(value).unwrap()
  }

  #[test]
  fn test_expired() {
    assert_eq!(
      expiry_status(d("2026-10-18"), d("2026-10-19"), 30),
      ExpiryStatus::Expired { days_overdue: 1 }
    );
  }

  #[test]
  fn test_last_day_is_still_expiring_not_expired() {
    assert_eq!(
      expiry_status(d("2026-10-19"), d("2026-10-19"), 30),
      ExpiryStatus::ExpiringSoon { days_left: 0 }
    );
  }

  #[test]
  fn test_window_boundary() {
    assert_eq!(
      expiry_status(d("2026-11-18"), d("2026-10-19"), 30),
      ExpiryStatus::ExpiringSoon { days_left: 30 }
    );
    assert_eq!(
      expiry_status(d("2026-11-19"), d("2026-10-19"), 30),
      ExpiryStatus::Valid { days_left: 31 }
    );
  }

  #[test]
  fn test_parse_date_rejects_other_formats() {
    assert!(parse_date("19/10/2026").is_none());
    assert_eq!(parse_date(" 2026-10-19 "), Some(d("2026-10-19")));
  }
}
