//! Form validation for payment details and catalog products.
//!
//! Every check returns the first problem found as a [`ValidationError`]
//! carrying the field and a Spanish message ready to show next to the input.
//! Inputs are trimmed before length checks; card numbers also drop spaces and
//! dashes.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::model::{PaymentDetail, Product};

/// Field length limits.
pub mod limits {
    pub const CARD_NUMBER_MIN: usize = 13;
    pub const CARD_NUMBER_MAX: usize = 19;
    pub const CVC_MIN: usize = 3;
    pub const CVC_MAX: usize = 4;
    pub const CARDHOLDER_NAME_MIN: usize = 3;
    pub const CARDHOLDER_NAME_MAX: usize = 100;
    pub const ADDRESS_MIN: usize = 5;
    pub const ADDRESS_MAX: usize = 200;
    pub const CITY_MIN: usize = 2;
    pub const CITY_MAX: usize = 50;
    pub const STATE_MIN: usize = 2;
    pub const STATE_MAX: usize = 50;
    pub const POSTAL_CODE_MIN: usize = 3;
    pub const POSTAL_CODE_MAX: usize = 10;
    pub const COUNTRY_MIN: usize = 2;
    pub const COUNTRY_MAX: usize = 50;
    pub const PAYMENT_NAME_MIN: usize = 2;
    pub const PAYMENT_NAME_MAX: usize = 50;
    /// Furthest accepted card expiry, in years from today.
    pub const EXPIRY_MAX_YEARS_AHEAD: i32 = 20;
}

/// Form field a [`ValidationError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CardNumber,
    ExpirationDate,
    Cvc,
    CardholderName,
    Address,
    City,
    State,
    PostalCode,
    Country,
    PaymentName,
    ProductName,
    ProductDescription,
    ProductPrice,
    ProductStock,
    ProductImage,
}

/// A rejected form value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Offending field.
    pub field: Field,
    /// Spanish message for the shopper.
    pub message: String,
}

impl ValidationError {
    fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

type Check = Result<(), ValidationError>;

// =============================================================================
// Card Fields
// =============================================================================

fn strip_card_separators(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Validate a card number: digits only, 13-19 long, Luhn checksum.
///
/// # Errors
///
/// Returns the first rule the number breaks.
///
/// ```
/// use tienda_core::validation::validate_card_number;
///
/// assert!(validate_card_number("4111 1111 1111 1111").is_ok());
/// assert!(validate_card_number("4111 1111 1111 1112").is_err());
/// ```
pub fn validate_card_number(card_number: &str) -> Check {
    let cleaned = strip_card_separators(card_number);

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            Field::CardNumber,
            "El número de tarjeta solo debe contener dígitos",
        ));
    }
    if cleaned.len() < limits::CARD_NUMBER_MIN {
        return Err(ValidationError::new(
            Field::CardNumber,
            format!(
                "El número de tarjeta debe tener al menos {} dígitos",
                limits::CARD_NUMBER_MIN
            ),
        ));
    }
    if cleaned.len() > limits::CARD_NUMBER_MAX {
        return Err(ValidationError::new(
            Field::CardNumber,
            format!(
                "El número de tarjeta no debe exceder {} dígitos",
                limits::CARD_NUMBER_MAX
            ),
        ));
    }
    if !luhn_valid(&cleaned) {
        return Err(ValidationError::new(
            Field::CardNumber,
            "El número de tarjeta no es válido",
        ));
    }
    Ok(())
}

/// Validate an expiry date in `MM/AA` or `MM/AAAA` relative to `today`.
///
/// A card is valid through the whole of its expiry month. Dates more than
/// twenty years out are rejected.
///
/// # Errors
///
/// Returns the first rule the date breaks.
pub fn validate_expiration_date(expiration_date: &str, today: NaiveDate) -> Check {
    let err = |msg: &str| Err(ValidationError::new(Field::ExpirationDate, msg));
    let cleaned: String = expiration_date.trim().chars().filter(|c| *c != '/').collect();

    if cleaned.is_empty() {
        return err("Ingrese la fecha de vencimiento");
    }
    if cleaned.chars().count() < 4 {
        return err("Formato incompleto. Use MM/AA");
    }
    if !(cleaned.len() == 4 || cleaned.len() == 6) || !cleaned.chars().all(|c| c.is_ascii_digit())
    {
        return err("Formato inválido. Use MM/AA o MM/AAAA");
    }

    let (month_part, year_part) = cleaned.split_at(2);
    let month: u32 = month_part.parse().unwrap_or(0);
    if !(1..=12).contains(&month) {
        return err("Mes inválido. Debe estar entre 01 y 12");
    }

    let year: i32 = year_part.parse().unwrap_or(0);
    let year = if year_part.len() == 2 { 2000 + year } else { year };

    if year < today.year() || (year == today.year() && month < today.month()) {
        return err("La tarjeta ha expirado");
    }
    if year > today.year() + limits::EXPIRY_MAX_YEARS_AHEAD {
        return err("La fecha de expiración es demasiado lejana");
    }
    Ok(())
}

/// Validate a CVC: 3 or 4 digits.
///
/// # Errors
///
/// Returns an error for non-digits or a wrong length.
pub fn validate_cvc(cvc: &str) -> Check {
    let cleaned = cvc.trim();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            Field::Cvc,
            "El CVC solo debe contener dígitos",
        ));
    }
    if !(limits::CVC_MIN..=limits::CVC_MAX).contains(&cleaned.len()) {
        return Err(ValidationError::new(
            Field::Cvc,
            format!(
                "El CVC debe tener entre {} y {} dígitos",
                limits::CVC_MIN,
                limits::CVC_MAX
            ),
        ));
    }
    Ok(())
}

// =============================================================================
// Billing Fields
// =============================================================================

/// Latin-1 letters, as accepted in names and cities.
fn is_name_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{C0}'..='\u{FF}').contains(&c)
}

fn check_length(field: Field, value: &str, min: usize, max: usize, noun: &str) -> Check {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::new(
            field,
            format!("{noun} debe tener al menos {min} caracteres"),
        ));
    }
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("{noun} no debe exceder {max} caracteres"),
        ));
    }
    Ok(())
}

/// Validate the cardholder name.
///
/// # Errors
///
/// Returns an error for a wrong length or characters other than letters,
/// spaces, dashes and apostrophes.
pub fn validate_cardholder_name(name: &str) -> Check {
    let cleaned = name.trim();
    check_length(
        Field::CardholderName,
        cleaned,
        limits::CARDHOLDER_NAME_MIN,
        limits::CARDHOLDER_NAME_MAX,
        "El nombre",
    )?;
    if !cleaned
        .chars()
        .all(|c| is_name_letter(c) || c.is_whitespace() || c == '\'' || c == '-')
    {
        return Err(ValidationError::new(
            Field::CardholderName,
            "El nombre solo debe contener letras, espacios, guiones y apóstrofos",
        ));
    }
    Ok(())
}

/// Validate a street address.
///
/// # Errors
///
/// Returns an error for a wrong length.
pub fn validate_address(address: &str) -> Check {
    check_length(
        Field::Address,
        address.trim(),
        limits::ADDRESS_MIN,
        limits::ADDRESS_MAX,
        "La dirección",
    )
}

/// Validate a city name.
///
/// # Errors
///
/// Returns an error for a wrong length or invalid characters.
pub fn validate_city(city: &str) -> Check {
    let cleaned = city.trim();
    check_length(
        Field::City,
        cleaned,
        limits::CITY_MIN,
        limits::CITY_MAX,
        "La ciudad",
    )?;
    if !cleaned
        .chars()
        .all(|c| is_name_letter(c) || c.is_whitespace() || matches!(c, '.' | '\'' | '-'))
    {
        return Err(ValidationError::new(
            Field::City,
            "La ciudad contiene caracteres inválidos",
        ));
    }
    Ok(())
}

/// Validate a state or province.
///
/// # Errors
///
/// Returns an error for a wrong length.
pub fn validate_state(state: &str) -> Check {
    check_length(
        Field::State,
        state.trim(),
        limits::STATE_MIN,
        limits::STATE_MAX,
        "El estado",
    )
}

/// Validate a postal code: letters, digits, spaces and dashes.
///
/// # Errors
///
/// Returns an error for a wrong length or invalid characters.
pub fn validate_postal_code(postal_code: &str) -> Check {
    let cleaned = postal_code.trim();
    check_length(
        Field::PostalCode,
        cleaned,
        limits::POSTAL_CODE_MIN,
        limits::POSTAL_CODE_MAX,
        "El código postal",
    )?;
    if !cleaned
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-')
    {
        return Err(ValidationError::new(
            Field::PostalCode,
            "El código postal contiene caracteres inválidos",
        ));
    }
    Ok(())
}

/// Validate a country.
///
/// # Errors
///
/// Returns an error for a wrong length.
pub fn validate_country(country: &str) -> Check {
    check_length(
        Field::Country,
        country.trim(),
        limits::COUNTRY_MIN,
        limits::COUNTRY_MAX,
        "El país",
    )
}

/// Validate the display name of a payment method.
///
/// # Errors
///
/// Returns an error when blank or of the wrong length.
pub fn validate_payment_name(name: &str) -> Check {
    let cleaned = name.trim();
    if cleaned.is_empty() {
        return Err(ValidationError::new(
            Field::PaymentName,
            "El nombre del método de pago es requerido",
        ));
    }
    check_length(
        Field::PaymentName,
        cleaned,
        limits::PAYMENT_NAME_MIN,
        limits::PAYMENT_NAME_MAX,
        "El nombre",
    )
}

/// Validate every card and billing field of a payment detail.
///
/// Missing fields are checked as empty strings. `address_line2` is optional
/// and not checked.
///
/// # Errors
///
/// Returns every failing field, in form order.
pub fn validate_card_detail(
    detail: &PaymentDetail,
    today: NaiveDate,
) -> Result<(), Vec<ValidationError>> {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    let errors: Vec<ValidationError> = [
        validate_card_number(&text(&detail.card_number)),
        validate_expiration_date(&text(&detail.expiration_date), today),
        validate_cvc(&text(&detail.cvc)),
        validate_cardholder_name(&text(&detail.cardholder_name)),
        validate_address(&text(&detail.address_line1)),
        validate_city(&text(&detail.city)),
        validate_state(&text(&detail.state_or_province)),
        validate_postal_code(&text(&detail.postal_code)),
        validate_country(&text(&detail.country)),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Group card digits in blocks of four.
///
/// ```
/// use tienda_core::validation::format_card_number;
///
/// assert_eq!(format_card_number("4111-1111-1111-1111"), "4111 1111 1111 1111");
/// ```
#[must_use]
pub fn format_card_number(card_number: &str) -> String {
    let cleaned: Vec<char> = strip_card_separators(card_number).chars().collect();
    cleaned
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize typed expiry input to `MM/AA`.
#[must_use]
pub fn format_expiration_date(expiration_date: &str) -> String {
    let cleaned: Vec<char> = expiration_date.chars().filter(|c| *c != '/').collect();
    if cleaned.len() < 2 {
        return cleaned.into_iter().collect();
    }
    let month: String = cleaned.iter().take(2).collect();
    let year: String = cleaned.iter().skip(2).take(2).collect();
    if year.is_empty() {
        month
    } else {
        format!("{month}/{year}")
    }
}

/// Mask all but the last four digits, grouped like [`format_card_number`].
///
/// ```
/// use tienda_core::validation::mask_card_number;
///
/// assert_eq!(mask_card_number("4111111111111111"), "**** **** **** 1111");
/// assert_eq!(mask_card_number("12"), "****");
/// ```
#[must_use]
pub fn mask_card_number(card_number: &str) -> String {
    let cleaned = strip_card_separators(card_number);
    let len = cleaned.chars().count();
    if len < 4 {
        return "****".to_string();
    }
    let last_four: String = cleaned.chars().skip(len - 4).collect();
    format_card_number(&format!("{}{last_four}", "*".repeat(len - 4)))
}

// =============================================================================
// Products
// =============================================================================

/// Validate a product before create or update.
///
/// # Errors
///
/// Returns the first blank field, non-positive price or negative stock.
pub fn validate_product(product: &Product) -> Check {
    if product.name.trim().is_empty() {
        return Err(ValidationError::new(
            Field::ProductName,
            "El nombre no puede estar vacío",
        ));
    }
    if product.description.trim().is_empty() {
        return Err(ValidationError::new(
            Field::ProductDescription,
            "La descripción no puede estar vacía",
        ));
    }
    if product.price <= Decimal::ZERO {
        return Err(ValidationError::new(
            Field::ProductPrice,
            "El precio debe ser mayor a 0",
        ));
    }
    if product.stock < 0 {
        return Err(ValidationError::new(
            Field::ProductStock,
            "El stock no puede ser negativo",
        ));
    }
    if product.url_image.trim().is_empty() {
        return Err(ValidationError::new(
            Field::ProductImage,
            "La URL de la imagen no puede estar vacía",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{PaymentId, ProductId, UserId};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn message(check: Check) -> String {
        check.unwrap_err().message
    }

    #[test]
    fn test_card_number_rules() {
        assert!(validate_card_number("4111111111111111").is_ok());
        assert!(validate_card_number("5500-0000-0000-0004").is_ok());
        assert_eq!(
            message(validate_card_number("4111x")),
            "El número de tarjeta solo debe contener dígitos"
        );
        assert_eq!(
            message(validate_card_number("411111111111")),
            "El número de tarjeta debe tener al menos 13 dígitos"
        );
        assert_eq!(
            message(validate_card_number("41111111111111111111")),
            "El número de tarjeta no debe exceder 19 dígitos"
        );
        assert_eq!(
            message(validate_card_number("4111111111111112")),
            "El número de tarjeta no es válido"
        );
    }

    #[test]
    fn test_expiration_date_rules() {
        assert!(validate_expiration_date("06/25", today()).is_ok());
        assert!(validate_expiration_date("12/2030", today()).is_ok());
        assert!(validate_expiration_date("0145", today()).is_ok());
        assert_eq!(
            message(validate_expiration_date("", today())),
            "Ingrese la fecha de vencimiento"
        );
        assert_eq!(
            message(validate_expiration_date("1/2", today())),
            "Formato incompleto. Use MM/AA"
        );
        assert_eq!(
            message(validate_expiration_date("12/255", today())),
            "Formato inválido. Use MM/AA o MM/AAAA"
        );
        assert_eq!(
            message(validate_expiration_date("13/27", today())),
            "Mes inválido. Debe estar entre 01 y 12"
        );
        assert_eq!(
            message(validate_expiration_date("05/25", today())),
            "La tarjeta ha expirado"
        );
        assert_eq!(
            message(validate_expiration_date("01/2046", today())),
            "La fecha de expiración es demasiado lejana"
        );
    }

    #[test]
    fn test_cvc_rules() {
        assert!(validate_cvc("123").is_ok());
        assert!(validate_cvc(" 1234 ").is_ok());
        assert_eq!(message(validate_cvc("12a")), "El CVC solo debe contener dígitos");
        assert_eq!(
            message(validate_cvc("12")),
            "El CVC debe tener entre 3 y 4 dígitos"
        );
    }

    #[test]
    fn test_billing_rules() {
        assert!(validate_cardholder_name("José O'Neil-Pérez").is_ok());
        assert_eq!(
            message(validate_cardholder_name("Al")),
            "El nombre debe tener al menos 3 caracteres"
        );
        assert_eq!(
            message(validate_cardholder_name("R2D2 Droid")),
            "El nombre solo debe contener letras, espacios, guiones y apóstrofos"
        );
        assert!(validate_address("Calle 10 # 5-20").is_ok());
        assert_eq!(
            message(validate_address("Cl 1")),
            "La dirección debe tener al menos 5 caracteres"
        );
        assert!(validate_city("Medellín").is_ok());
        assert_eq!(
            message(validate_city("Cali3")),
            "La ciudad contiene caracteres inválidos"
        );
        assert!(validate_state("Valle").is_ok());
        assert!(validate_postal_code("050021").is_ok());
        assert_eq!(
            message(validate_postal_code("05#21")),
            "El código postal contiene caracteres inválidos"
        );
        assert_eq!(
            message(validate_country(&"x".repeat(51))),
            "El país no debe exceder 50 caracteres"
        );
        assert_eq!(
            message(validate_payment_name("  ")),
            "El nombre del método de pago es requerido"
        );
    }

    #[test]
    fn test_validate_card_detail_collects_all_errors() {
        let mut detail = PaymentDetail::new(UserId::new(1), PaymentId::new(2));
        let errors = validate_card_detail(&detail, today()).unwrap_err();
        assert_eq!(errors.len(), 9);
        assert_eq!(errors[0].field, Field::CardNumber);

        detail.card_number = Some("4111 1111 1111 1111".to_string());
        detail.expiration_date = Some("08/27".to_string());
        detail.cvc = Some("321".to_string());
        detail.cardholder_name = Some("Ana Gómez".to_string());
        detail.address_line1 = Some("Carrera 43A # 1-50".to_string());
        detail.city = Some("Medellín".to_string());
        detail.state_or_province = Some("Antioquia".to_string());
        detail.postal_code = Some("050021".to_string());
        detail.country = Some("Colombia".to_string());
        assert!(validate_card_detail(&detail, today()).is_ok());
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_card_number("4111111111111"), "4111 1111 1111 1");
        assert_eq!(format_expiration_date("0827"), "08/27");
        assert_eq!(format_expiration_date("08"), "08");
        assert_eq!(format_expiration_date("0"), "0");
        assert_eq!(mask_card_number("5500 0000 0000 0004"), "**** **** **** 0004");
    }

    #[test]
    fn test_validate_product() {
        let mut product = Product {
            id: ProductId::new(1),
            name: "Whey".to_string(),
            description: "Proteína".to_string(),
            price: Decimal::new(10, 0),
            stock: 0,
            url_image: "http://img".to_string(),
        };
        assert!(validate_product(&product).is_ok());
        product.price = Decimal::ZERO;
        assert_eq!(message(validate_product(&product)), "El precio debe ser mayor a 0");
        product.price = Decimal::ONE;
        product.stock = -1;
        assert_eq!(
            message(validate_product(&product)),
            "El stock no puede ser negativo"
        );
    }
}
