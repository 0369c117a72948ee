// app/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MAX_REVIEW_TEXT_CHARS: usize = 2048;
pub const MAX_REVIEW_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
  pub id: Uuid,
  pub product_id: Uuid,
  pub customer_id: Uuid,
  pub rate: i32,
  pub text: String,
  pub title: Option<String>,
  pub is_approved: bool,
  pub is_verified: bool,
  pub helpful_count: i32,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
  pub product_id: Uuid,
  pub customer_id: Uuid,
  pub rate: i32,
  pub text: String,
  pub title: Option<String>,
}

impl NewReview {
  /// Checks rate bounds and text lengths. Returns a message suitable for the client.
  pub fn validate(&self) -> Result<(), String> {
    check_rate(self.rate)?;
    check_text(&self.text)?;
    check_title(self.title.as_deref())
  }
}

/// Author edits. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewUpdate {
  pub rate: Option<i32>,
  pub text: Option<String>,
  pub title: Option<String>,
}

impl ReviewUpdate {
  pub fn is_empty(&self) -> bool {
    self.rate.is_none() && self.text.is_none() && self.title.is_none()
  }

  pub fn validate(&self) -> Result<(), String> {
    if let Some(rate) = self.rate {
      check_rate(rate)?;
    }
    if let Some(text) = &self.text {
      check_text(text)?;
    }
    check_title(self.title.as_deref())
  }

  pub fn apply_to(self, review: &mut Review) {
    if let Some(rate) = self.rate {
      review.rate = rate;
    }
    if let Some(text) = self.text {
      review.text = text;
    }
    if let Some(title) = self.title {
      review.title = Some(title).filter(|t| !t.is_empty());
    }
  }
}

fn check_rate(rate: i32) -> Result<(), String> {
  if !(1..=5).contains(&rate) {
    return Err("Rate must be between 1 and 5.".to_string());
  }
  Ok(())
}

fn check_text(text: &str) -> Result<(), String> {
  if text.trim().is_empty() {
    return Err("Review text is required.".to_string());
  }
  if text.chars().count() > MAX_REVIEW_TEXT_CHARS {
    return Err(format!("Review text must be at most {} characters.", MAX_REVIEW_TEXT_CHARS));
  }
  Ok(())
}

fn check_title(title: Option<&str>) -> Result<(), String> {
  if title.map_or(false, |t| t.chars().count() > MAX_REVIEW_TITLE_CHARS) {
    return Err(format!("Review title must be at most {} characters.", MAX_REVIEW_TITLE_CHARS));
  }
  Ok(())
}

/// Mean of the given rates, 0 for none.
pub fn average_rate<I: IntoIterator<Item = i32>>(rates: I) -> f64 {
  let (sum, count) = rates.into_iter().fold((0i64, 0i64), |(s, c), r| (s + r as i64, c + 1));
  if count == 0 {
    0.0
  } else {
    sum as f64 / count as f64
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn review(rate: i32, text: &str, title: Option<&str>) -> NewReview {
    NewReview {
      product_id: Uuid::new_v4(),
      customer_id: Uuid::new_v4(),
      rate,
      text: text.to_string(),
      title: title.map(String::from),
    }
  }

  #[test]
  fn rate_must_be_one_to_five() {
    assert!(review(0, "meh", None).validate().is_err());
    assert!(review(6, "wow", None).validate().is_err());
    assert!(review(5, "wow", Some("Great")).validate().is_ok());
  }

  #[test]
  fn text_and_title_limits() {
    assert!(review(3, "   ", None).validate().is_err());
    assert!(review(3, &"x".repeat(MAX_REVIEW_TEXT_CHARS + 1), None).validate().is_err());
    assert!(review(3, "fine", Some(&"t".repeat(MAX_REVIEW_TITLE_CHARS + 1))).validate().is_err());
  }

  #[test]
  fn update_validates_only_present_fields() {
    assert!(ReviewUpdate::default().is_empty());
    assert!(ReviewUpdate { rate: Some(4), ..Default::default() }.validate().is_ok());
    assert!(ReviewUpdate { rate: Some(9), ..Default::default() }.validate().is_err());
    assert!(ReviewUpdate { text: Some(" ".into()), ..Default::default() }.validate().is_err());
  }

  #[test]
  fn update_applies_present_fields() {
    let mut existing = Review {
      id: Uuid::new_v4(),
      product_id: Uuid::new_v4(),
      customer_id: Uuid::new_v4(),
      rate: 2,
      text: "meh".to_string(),
      title: Some("Old".to_string()),
      is_approved: true,
      is_verified: false,
      helpful_count: 0,
      created_at: chrono::Utc::now(),
    };
    ReviewUpdate {
      rate: Some(5),
      text: None,
      title: Some(String::new()),
    }
    .apply_to(&mut existing);
    assert_eq!(existing.rate, 5);
    assert_eq!(existing.text, "meh");
    assert_eq!(existing.title, None);
  }

  #[test]
  fn average_of_rates() {
    assert_eq!(average_rate(Vec::new()), 0.0);
    assert_eq!(average_rate(vec![4, 5]), 4.5);
  }
}
