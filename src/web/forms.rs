//! Request bodies for every form-accepting route, and their field checks.
//!
//! Fields are plain strings so that a blank or malformed value reaches the
//! checks below instead of failing inside the extractor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{db::DishRecord, error::Error};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_IMAGE_URL_LEN: usize = 255;
/// Largest accepted price. Cents stay exact through the REAL price column below this.
pub const MAX_PRICE: i64 = 1_000_000_000;

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    // unchecked boxes are not submitted at all
    pub remember: Option<String>,
}

impl LoginForm {
    pub fn remember(&self) -> bool {
        matches!(
            self.remember.as_deref(),
            Some("on" | "1" | "true" | "y" | "yes")
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Used for both restaurants and sub-menus.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
}

impl NameForm {
    pub fn validate(&self) -> Result<String, Error> {
        required_text("Name", &self.name, Some(MAX_NAME_LEN))
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DishForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub available: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub sub_menu_id: String,
}

impl DishForm {
    pub fn validate(&self) -> Result<DishRecord, Error> {
        Ok(DishRecord {
            name: required_text("Name", &self.name, Some(MAX_NAME_LEN))?,
            description: required_text("Description", &self.description, None)?,
            price: parse_price(&self.price)?,
            available: parse_flag("Available", &self.available)?,
            image_url: required_text("Image URL", &self.image_url, Some(MAX_IMAGE_URL_LEN))?,
            sub_menu_id: parse_optional_id("Sub-menu", &self.sub_menu_id)?,
        })
    }
}

pub fn required_text(field: &str, value: &str, max_len: Option<usize>) -> Result<String, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{field} is required.")));
    }
    if let Some(max) = max_len {
        if value.chars().count() > max {
            return Err(Error::validation(format!(
                "{field} must be at most {max} characters."
            )));
        }
    }
    Ok(value.to_owned())
}

/// A non-negative decimal below [`MAX_PRICE`] with at most two fractional digits.
pub fn parse_price(value: &str) -> Result<Decimal, Error> {
    let price = Decimal::from_str(value.trim())
        .map_err(|_| Error::validation("Price must be a number, e.g. 25.50."))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(Error::validation("Price cannot be negative."));
    }
    if price.normalize().scale() > 2 {
        return Err(Error::validation(
            "Price must have at most two decimal places.",
        ));
    }
    if price >= Decimal::from(MAX_PRICE) {
        return Err(Error::validation(format!(
            "Price must be less than {MAX_PRICE}."
        )));
    }
    Ok(price)
}

/// The `0`/`1` integer flag used by the dish form.
pub fn parse_flag(field: &str, value: &str) -> Result<bool, Error> {
    match value.trim().parse::<i64>() {
        Ok(0) => Ok(false),
        Ok(1) => Ok(true),
        _ => Err(Error::validation(format!("{field} must be 0 or 1."))),
    }
}

/// Blank means "no selection".
pub fn parse_optional_id(field: &str, value: &str) -> Result<Option<i32>, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i32>()
        .map(Some)
        .map_err(|_| Error::validation(format!("{field} is not a valid selection.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dish_form() -> DishForm {
        DishForm {
            name: " Margherita ".to_owned(),
            description: "Tomato, mozzarella, basil".to_owned(),
            price: "25.50".to_owned(),
            available: "1".to_owned(),
            image_url: "https://img.example/m.png".to_owned(),
            sub_menu_id: String::new(),
        }
    }

    #[test]
    fn valid_dish_form() {
        let record = dish_form().validate().unwrap();

        assert_eq!(record.name, "Margherita");
        assert_eq!(record.price, Decimal::from_str("25.50").unwrap());
        assert!(record.available);
        assert_eq!(record.sub_menu_id, None);
    }

    #[test]
    fn price_rules() {
        assert_eq!(parse_price("0").unwrap(), Decimal::ZERO);
        assert_eq!(parse_price(" 12 ").unwrap(), Decimal::from(12));
        assert_eq!(parse_price("9.90").unwrap(), Decimal::from_str("9.9").unwrap());
        assert!(parse_price("-1").is_err());
        assert!(parse_price("abc").is_err());
        assert!(parse_price("").is_err());
        assert!(parse_price("1.999").is_err());
    }

    #[test]
    fn price_has_an_upper_bound() {
        assert_eq!(
            parse_price("999999999.99").unwrap(),
            Decimal::from_str("999999999.99").unwrap()
        );
        let err = parse_price("123456789012345678.99").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(parse_price("1000000000").is_err());
    }

    #[test]
    fn available_flag_is_zero_or_one() {
        assert!(!parse_flag("Available", "0").unwrap());
        assert!(parse_flag("Available", "1").unwrap());
        assert!(parse_flag("Available", "2").is_err());
        assert!(parse_flag("Available", "yes").is_err());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut form = dish_form();
        form.image_url = "   ".to_owned();

        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Image URL is required.");
    }

    #[test]
    fn names_have_a_length_limit() {
        let form = NameForm {
            name: "x".repeat(MAX_NAME_LEN + 1),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn sub_menu_selection() {
        assert_eq!(parse_optional_id("Sub-menu", "").unwrap(), None);
        assert_eq!(parse_optional_id("Sub-menu", "3").unwrap(), Some(3));
        assert!(parse_optional_id("Sub-menu", "three").is_err());
    }

    #[test]
    fn remember_checkbox() {
        let mut form = LoginForm::default();
        assert!(!form.remember());
        form.remember = Some("on".to_owned());
        assert!(form.remember());
    }
}
