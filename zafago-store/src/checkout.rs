//! Checkout: billing validation, payment capture and key delivery
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use thiserror::Error;

use crate::cart::{Cart, CartSummary, MAX_LINE_QUANTITY};
use crate::catalog::Catalog;
use crate::keys::KeyIssuer;
use crate::money::format_cents;
use crate::promo::AppliedPromo;

static EMAIL_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());
static EXPIRY_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").ok());
static CVC_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d{3,4}$").ok());

fn is_match(re: &Lazy<Option<Regex>>, value: &str) -> bool {
    Lazy::force(re)
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Who receives the game keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PaymentMethod {
    CreditCard {
        number: String,
        /// `MM/YY`
        expiry: String,
        cvc: String,
    },
    #[serde(rename = "paypal")]
    PayPal,
    Crypto,
}

impl PaymentMethod {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CreditCard { .. } => "Credit Card",
            Self::PayPal => "PayPal",
            Self::Crypto => "Crypto",
        }
    }
}

/// Form validation failures, one per offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("'{0}' is not a valid email address")]
    Email(String),
    #[error("card number is invalid")]
    CardNumber,
    #[error("expiry must be MM/YY")]
    Expiry,
    #[error("security code must be 3 or 4 digits")]
    Cvc,
    #[error("quantity {quantity} for product {product_id} exceeds {max}", max = MAX_LINE_QUANTITY)]
    Quantity { product_id: u32, quantity: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("payment provider unavailable")]
    Unavailable,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl BillingDetails {
    /// # Errors
    ///
    /// Returns the first missing or malformed field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("first name", &self.first_name)?;
        require("last name", &self.last_name)?;
        require("email", &self.email)?;
        if !is_match(&EMAIL_RE, self.email.trim()) {
            return Err(ValidationError::Email(self.email.clone()));
        }
        Ok(())
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

impl PaymentMethod {
    /// # Errors
    ///
    /// Returns the first missing or malformed card field. Wallet methods have
    /// nothing to validate up front.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Self::CreditCard { number, expiry, cvc } = self else {
            return Ok(());
        };
        require("card number", number)?;
        require("expiry", expiry)?;
        require("security code", cvc)?;
        let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
        if !(13..=19).contains(&digits.len()) || !luhn_valid(&digits) {
            return Err(ValidationError::CardNumber);
        }
        if !is_match(&EXPIRY_RE, expiry.trim()) {
            return Err(ValidationError::Expiry);
        }
        if !is_match(&CVC_RE, cvc.trim()) {
            return Err(ValidationError::Cvc);
        }
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

/// Luhn checksum over an all-digit string.
fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (idx, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if idx % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

/// What the gateway is asked to capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub order_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub reference: String,
    pub amount_cents: i64,
}

/// Captures payments. Checkout depends on this seam instead of a provider.
pub trait PaymentGateway {
    /// # Errors
    ///
    /// Returns an error if the payment is declined or cannot be processed.
    fn charge(&self, request: &ChargeRequest) -> Result<PaymentReceipt, PaymentError>;
}

#[derive(Debug, Clone, Default)]
enum MockOutcome {
    #[default]
    Approve,
    Decline(String),
    Offline,
}

/// Gateway that approves everything unless told to decline or to act offline.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    outcome: MockOutcome,
}

impl MockGateway {
    #[must_use]
    pub const fn approving() -> Self {
        Self {
            outcome: MockOutcome::Approve,
        }
    }

    #[must_use]
    pub fn declining(reason: impl Into<String>) -> Self {
        Self {
            outcome: MockOutcome::Decline(reason.into()),
        }
    }

    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            outcome: MockOutcome::Offline,
        }
    }
}

impl PaymentGateway for MockGateway {
    fn charge(&self, request: &ChargeRequest) -> Result<PaymentReceipt, PaymentError> {
        match &self.outcome {
            MockOutcome::Approve => {}
            MockOutcome::Decline(reason) => return Err(PaymentError::Declined(reason.clone())),
            MockOutcome::Offline => return Err(PaymentError::Unavailable),
        }
        Ok(PaymentReceipt {
            reference: format!("mock-{}", request.order_id.to_lowercase()),
            amount_cents: request.amount_cents,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Completed,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// One delivered unit: a title, the storefront it activates on and its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: u32,
    pub title: String,
    pub platform: String,
    pub price_cents: i64,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub date: NaiveDate,
    pub email: String,
    pub lines: Vec<OrderLine>,
    pub summary: CartSummary,
    pub payment_reference: String,
    pub status: OrderStatus,
}

impl Order {
    #[must_use]
    pub const fn total_cents(&self) -> i64 {
        self.summary.total_cents
    }
}

/// Everything the checkout form submits.
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    pub cart: &'a Cart,
    pub billing: &'a BillingDetails,
    pub method: &'a PaymentMethod,
    pub promo: Option<&'a AppliedPromo>,
    pub date: NaiveDate,
    /// Orders the shopper placed before this one. Identical carts bought
    /// again get a fresh order id and fresh keys.
    pub sequence: usize,
}

/// Validate, charge and deliver keys for the cart.
///
/// # Errors
///
/// Returns an error if the cart is empty, the form is invalid, or the gateway
/// refuses the charge. No keys are issued unless the charge succeeds.
pub fn place_order(
    request: &CheckoutRequest<'_>,
    catalog: &Catalog,
    tax_rate_bps: u32,
    issuer: &KeyIssuer,
    gateway: &dyn PaymentGateway,
) -> Result<Order, CheckoutError> {
    let resolved = request.cart.resolve(catalog);
    if resolved.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    if let Some(line) = resolved.iter().find(|line| line.quantity > MAX_LINE_QUANTITY) {
        return Err(ValidationError::Quantity {
            product_id: line.product.id,
            quantity: line.quantity,
        }
        .into());
    }
    request.billing.validate()?;
    request.method.validate()?;

    let summary = request.cart.summarize(catalog, tax_rate_bps, request.promo);
    let order_id = issuer.order_id(order_fingerprint(request).as_bytes());

    let receipt = gateway
        .charge(&ChargeRequest {
            order_id: order_id.clone(),
            amount_cents: summary.total_cents,
            method: request.method.clone(),
            email: request.billing.email.trim().to_string(),
        })
        .inspect_err(|err| log::warn!("order {order_id} not charged: {err}"))?;

    let mut lines = Vec::new();
    for line in &resolved {
        for unit in 0..line.quantity {
            lines.push(OrderLine {
                product_id: line.product.id,
                title: line.product.title.clone(),
                platform: line.product.primary_platform().to_string(),
                price_cents: line.product.effective_price_cents(),
                key: issuer.activation_key(&order_id, line.product.id, unit),
            });
        }
    }

    log::info!(
        "order {order_id} completed: {} keys, total {}",
        lines.len(),
        format_cents(summary.total_cents)
    );

    Ok(Order {
        id: order_id,
        date: request.date,
        email: request.billing.email.trim().to_string(),
        lines,
        summary,
        payment_reference: receipt.reference,
        status: OrderStatus::Completed,
    })
}

fn order_fingerprint(request: &CheckoutRequest<'_>) -> String {
    let mut fp = format!(
        "{}|{}|#{}",
        request.billing.email.trim().to_lowercase(),
        request.date,
        request.sequence
    );
    for line in &request.cart.lines {
        let _ = write!(fp, "|{}x{}", line.product_id, line.quantity);
    }
    if let Some(promo) = request.promo {
        let _ = write!(fp, "|promo:{}", promo.code.to_lowercase());
    }
    fp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::is_well_formed_key;

    fn billing() -> BillingDetails {
        BillingDetails {
            first_name: "Alex".to_string(),
            last_name: "Johnson".to_string(),
            email: "alex.johnson@example.com".to_string(),
        }
    }

    fn card() -> PaymentMethod {
        PaymentMethod::CreditCard {
            number: "4242 4242 4242 4242".to_string(),
            expiry: "12/29".to_string(),
            cvc: "123".to_string(),
        }
    }

    fn demo_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(1, 1);
        cart.add_item(4, 1);
        cart
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn issuer() -> KeyIssuer {
        KeyIssuer::new(b"checkout-tests").unwrap()
    }

    #[test]
    fn billing_validation() {
        assert!(billing().validate().is_ok());
        let mut missing = billing();
        missing.last_name = "  ".to_string();
        assert_eq!(
            missing.validate(),
            Err(ValidationError::Required("last name"))
        );
        let mut bad_email = billing();
        bad_email.email = "alex@".to_string();
        assert!(matches!(bad_email.validate(), Err(ValidationError::Email(_))));
        assert_eq!(billing().full_name(), "Alex Johnson");
    }

    #[test]
    fn card_validation() {
        assert!(card().validate().is_ok());
        assert!(PaymentMethod::PayPal.validate().is_ok());
        assert!(PaymentMethod::Crypto.validate().is_ok());

        let bad_number = PaymentMethod::CreditCard {
            number: "4242 4242 4242 4241".to_string(),
            expiry: "12/29".to_string(),
            cvc: "123".to_string(),
        };
        assert_eq!(bad_number.validate(), Err(ValidationError::CardNumber));

        let bad_expiry = PaymentMethod::CreditCard {
            number: "4242424242424242".to_string(),
            expiry: "13/29".to_string(),
            cvc: "123".to_string(),
        };
        assert_eq!(bad_expiry.validate(), Err(ValidationError::Expiry));

        let bad_cvc = PaymentMethod::CreditCard {
            number: "4242424242424242".to_string(),
            expiry: "01/30".to_string(),
            cvc: "12".to_string(),
        };
        assert_eq!(bad_cvc.validate(), Err(ValidationError::Cvc));

        let missing = PaymentMethod::CreditCard {
            number: String::new(),
            expiry: "01/30".to_string(),
            cvc: "123".to_string(),
        };
        assert_eq!(missing.validate(), Err(ValidationError::Required("card number")));
    }

    #[test]
    fn places_order_and_issues_keys() {
        let cart = demo_cart();
        let method = card();
        let billing = billing();
        let request = CheckoutRequest {
            cart: &cart,
            billing: &billing,
            method: &method,
            promo: None,
            date: date(),
            sequence: 0,
        };
        let order = place_order(
            &request,
            Catalog::load_from_static(),
            500,
            &issuer(),
            &MockGateway::approving(),
        )
        .unwrap();

        assert!(order.id.starts_with("ORD-"));
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.total_cents(), 8188);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].title, "Elden Ring");
        assert_eq!(order.lines[0].price_cents, 4799);
        assert_eq!(order.lines[1].platform, "GOG");
        assert!(order.lines.iter().all(|l| is_well_formed_key(&l.key)));
        assert_eq!(order.payment_reference, format!("mock-{}", order.id.to_lowercase()));

        let again = place_order(
            &request,
            Catalog::load_from_static(),
            500,
            &issuer(),
            &MockGateway::approving(),
        )
        .unwrap();
        assert_eq!(order, again);
    }

    #[test]
    fn issues_one_key_per_unit() {
        let mut cart = Cart::new();
        cart.add_item(9, 3);
        let billing = billing();
        let request = CheckoutRequest {
            cart: &cart,
            billing: &billing,
            method: &PaymentMethod::PayPal,
            promo: None,
            date: date(),
            sequence: 0,
        };
        let order = place_order(
            &request,
            Catalog::load_from_static(),
            500,
            &issuer(),
            &MockGateway::default(),
        )
        .unwrap();
        assert_eq!(order.lines.len(), 3);
        assert_eq!(order.total_cents(), 0);
        let mut keys: Vec<&str> = order.lines.iter().map(|l| l.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn promo_reduces_charged_total() {
        let cart = demo_cart();
        let billing = billing();
        let promo = AppliedPromo {
            code: "WELCOME20".to_string(),
            percent: 20,
            discount_cents: 1560,
        };
        let request = CheckoutRequest {
            cart: &cart,
            billing: &billing,
            method: &PaymentMethod::Crypto,
            promo: Some(&promo),
            date: date(),
            sequence: 0,
        };
        let order = place_order(
            &request,
            Catalog::load_from_static(),
            500,
            &issuer(),
            &MockGateway::approving(),
        )
        .unwrap();
        assert_eq!(order.total_cents(), 7798 + 390 - 1560);
    }

    #[test]
    fn rejects_empty_cart_invalid_form_and_declines() {
        let empty = Cart::new();
        let billing = billing();
        let method = card();
        let catalog = Catalog::load_from_static();
        let request = CheckoutRequest {
            cart: &empty,
            billing: &billing,
            method: &method,
            promo: None,
            date: date(),
            sequence: 0,
        };
        assert!(matches!(
            place_order(&request, catalog, 500, &issuer(), &MockGateway::approving()),
            Err(CheckoutError::EmptyCart)
        ));

        let cart = demo_cart();
        let bad_billing = BillingDetails {
            email: "nobody".to_string(),
            ..billing.clone()
        };
        let request = CheckoutRequest {
            cart: &cart,
            billing: &bad_billing,
            method: &method,
            promo: None,
            date: date(),
            sequence: 0,
        };
        assert!(matches!(
            place_order(&request, catalog, 500, &issuer(), &MockGateway::approving()),
            Err(CheckoutError::Invalid(ValidationError::Email(_)))
        ));

        let request = CheckoutRequest {
            cart: &cart,
            billing: &billing,
            method: &method,
            promo: None,
            date: date(),
            sequence: 0,
        };
        let err = place_order(
            &request,
            catalog,
            500,
            &issuer(),
            &MockGateway::declining("insufficient funds"),
        )
        .unwrap_err();
        assert!(matches!(err, CheckoutError::Payment(PaymentError::Declined(_))));
        assert_eq!(err.to_string(), "payment declined: insufficient funds");
    }

    #[test]
    fn repeat_purchase_gets_new_id_and_keys() {
        let cart = demo_cart();
        let billing = billing();
        let first = CheckoutRequest {
            cart: &cart,
            billing: &billing,
            method: &PaymentMethod::PayPal,
            promo: None,
            date: date(),
            sequence: 0,
        };
        let second = CheckoutRequest {
            sequence: 1,
            ..first.clone()
        };
        let catalog = Catalog::load_from_static();
        let gateway = MockGateway::approving();
        let a = place_order(&first, catalog, 500, &issuer(), &gateway).unwrap();
        let b = place_order(&second, catalog, 500, &issuer(), &gateway).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.lines.iter().zip(&b.lines).all(|(x, y)| x.key != y.key));
        assert_eq!(a.total_cents(), b.total_cents());
    }

    #[test]
    fn rejects_oversized_line_from_untrusted_cart() {
        let cart: Cart =
            serde_json::from_str(r#"{"lines":[{"product_id":9,"quantity":4000000000}]}"#).unwrap();
        let billing = billing();
        let request = CheckoutRequest {
            cart: &cart,
            billing: &billing,
            method: &PaymentMethod::PayPal,
            promo: None,
            date: date(),
            sequence: 0,
        };
        let err = place_order(
            &request,
            Catalog::load_from_static(),
            500,
            &issuer(),
            &MockGateway::approving(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Invalid(ValidationError::Quantity { product_id: 9, .. })
        ));
    }

    #[test]
    fn unavailable_gateway_issues_nothing() {
        let cart = demo_cart();
        let billing = billing();
        let request = CheckoutRequest {
            cart: &cart,
            billing: &billing,
            method: &PaymentMethod::Crypto,
            promo: None,
            date: date(),
            sequence: 0,
        };
        let err = place_order(
            &request,
            Catalog::load_from_static(),
            500,
            &issuer(),
            &MockGateway::unavailable(),
        )
        .unwrap_err();
        assert!(matches!(err, CheckoutError::Payment(PaymentError::Unavailable)));
        assert_eq!(err.to_string(), "payment provider unavailable");
    }

    #[test]
    fn payment_method_serde_tags() {
        let json = serde_json::to_string(&PaymentMethod::PayPal).unwrap();
        assert_eq!(json, r#"{"kind":"paypal"}"#);
        let method: PaymentMethod = serde_json::from_str(
            r#"{"kind":"credit-card","number":"4242424242424242","expiry":"01/30","cvc":"123"}"#,
        )
        .unwrap();
        assert_eq!(method.label(), "Credit Card");
    }
}
