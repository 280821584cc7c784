use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use zafago_store::money::percent_of_cents;
use zafago_store::{
    BillingDetails, Cart, CheckoutError, CheckoutRequest, MockGateway, PaymentError, PaymentMethod,
    Profile, PromoError, is_well_formed_key,
};

use super::ScenarioCtx;

fn random_cart(ctx: &ScenarioCtx<'_>, rng: &mut ChaCha8Rng) -> Cart {
    let mut cart = Cart::new();
    let picks = rng.gen_range(1..=3);
    for product in ctx.store.catalog().products().choose_multiple(rng, picks) {
        let qty = rng.gen_range(1..=3);
        cart.add_item(product.id, qty);
    }
    cart
}

/// Billing form for a shopper derived from the iteration seed.
fn billing(ctx: &ScenarioCtx<'_>) -> BillingDetails {
    BillingDetails {
        first_name: "Alex".to_string(),
        last_name: "Johnson".to_string(),
        email: format!("shopper{}@example.com", ctx.seed % 10_000),
    }
}

fn random_method(rng: &mut ChaCha8Rng) -> PaymentMethod {
    match rng.gen_range(0..3) {
        0 => PaymentMethod::CreditCard {
            number: "4242 4242 4242 4242".to_string(),
            expiry: "12/30".to_string(),
            cvc: "123".to_string(),
        },
        1 => PaymentMethod::PayPal,
        _ => PaymentMethod::Crypto,
    }
}

fn order_date(ctx: &ScenarioCtx<'_>) -> Result<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(2025, 3, 10).context("invalid base date")?;
    let offset = u64::try_from(ctx.iteration).unwrap_or(0) % 365;
    base.checked_add_days(chrono::Days::new(offset))
        .context("order date out of range")
}

/// Cart math and promo codes over random carts.
pub fn check_cart_totals(ctx: &ScenarioCtx<'_>, rng: &mut ChaCha8Rng) -> Result<()> {
    let store = ctx.store;
    let catalog = store.catalog();
    let tax_bps = store.config().tax_rate_bps;
    let cart = random_cart(ctx, rng);

    let expected_subtotal: i64 = cart
        .resolve(catalog)
        .iter()
        .map(|line| line.product.effective_price_cents() * i64::from(line.quantity))
        .sum();
    let summary = store.summarize(&cart, None);
    ensure!(summary.subtotal_cents == expected_subtotal, "subtotal mismatch: {summary:?}");
    ensure!(
        summary.tax_cents == percent_of_cents(expected_subtotal, tax_bps),
        "tax mismatch: {summary:?}"
    );
    ensure!(
        summary.total_cents == summary.subtotal_cents + summary.tax_cents,
        "total without promo: {summary:?}"
    );

    for (code, pct) in &store.config().promo_codes {
        let shouted = code.to_uppercase();
        let promo = store
            .redeem_promo(&shouted, &cart)
            .with_context(|| format!("promo {shouted} should redeem"))?;
        ensure!(promo.percent == *pct, "promo {shouted} percent");
        let with_promo = store.summarize(&cart, Some(&promo));
        ensure!(
            with_promo.total_cents
                == with_promo.subtotal_cents + with_promo.tax_cents - with_promo.discount_cents,
            "total identity broken: {with_promo:?}"
        );
        ensure!(
            with_promo.discount_cents <= with_promo.subtotal_cents,
            "discount exceeds subtotal"
        );
    }

    match store.redeem_promo("NOT-A-CODE", &cart) {
        Err(PromoError::Unknown(code)) if code == "NOT-A-CODE" => {}
        other => bail!("unknown promo should be rejected, got {other:?}"),
    }
    ensure!(
        store.redeem_promo("  ", &cart) == Err(PromoError::Empty),
        "blank promo should be rejected"
    );

    let mut edited = cart.clone();
    if let Some(line) = cart.lines.first() {
        ensure!(!edited.set_quantity(line.product_id, 0), "quantity 0 is ignored");
        edited.remove_item(line.product_id);
        ensure!(edited.quantity_of(line.product_id) == 0, "removed line lingers");
    }
    Ok(())
}

/// Orders charge the summary total, deliver one key per unit and land in the
/// profile. Declined payments deliver nothing.
pub fn check_checkout(ctx: &ScenarioCtx<'_>, rng: &mut ChaCha8Rng) -> Result<()> {
    let store = ctx.store;
    let cart = random_cart(ctx, rng);
    let billing = billing(ctx);
    let method = random_method(rng);
    let date = order_date(ctx)?;
    let mut profile = Profile::new("Alex Johnson", billing.email.clone(), date);
    for line in &cart.lines {
        profile.toggle_wishlist(line.product_id);
    }
    let request = CheckoutRequest {
        cart: &cart,
        billing: &billing,
        method: &method,
        promo: None,
        date,
        sequence: profile.orders.len(),
    };

    let order = store
        .checkout(&request, &MockGateway::approving())
        .context("approved checkout failed")?;
    ensure!(order.id.starts_with("ORD-") && order.id.len() == 11, "order id {}", order.id);
    ensure!(
        order.total_cents() == store.summarize(&cart, None).total_cents,
        "order total differs from cart summary"
    );
    ensure!(
        order.lines.len() == usize::try_from(cart.item_count())?,
        "expected one key per unit, got {} for {} units",
        order.lines.len(),
        cart.item_count()
    );
    ensure!(
        order.lines.iter().all(|line| is_well_formed_key(&line.key)),
        "malformed activation key in {}",
        order.id
    );

    let replay = store.checkout(&request, &MockGateway::approving())?;
    ensure!(replay == order, "same checkout should replay identically");

    profile.record_order(&order);
    for line in &cart.lines {
        ensure!(profile.owns(line.product_id), "profile should own {}", line.product_id);
        ensure!(profile.key_for(line.product_id).is_some(), "missing key for {}", line.product_id);
    }
    ensure!(profile.wishlist.is_empty(), "purchased games should leave the wishlist");
    ensure!(profile.orders.first().map(|o| o.id.as_str()) == Some(order.id.as_str()), "history");

    let repeat_request = CheckoutRequest {
        sequence: profile.orders.len(),
        ..request.clone()
    };
    let repeat = store.checkout(&repeat_request, &MockGateway::approving())?;
    ensure!(repeat.id != order.id, "repeat purchase reused order id {}", order.id);
    ensure!(
        repeat.lines.iter().zip(&order.lines).all(|(a, b)| a.key != b.key),
        "repeat purchase reused activation keys"
    );
    profile.record_order(&repeat);
    ensure!(profile.orders.len() == 2, "both orders belong in history");

    match store.checkout(&request, &MockGateway::declining("card declined")) {
        Err(CheckoutError::Payment(PaymentError::Declined(_))) => {}
        other => bail!("declined payment should fail checkout, got {other:?}"),
    }
    match store.checkout(&request, &MockGateway::unavailable()) {
        Err(CheckoutError::Payment(PaymentError::Unavailable)) => {}
        other => bail!("offline gateway should fail checkout, got {other:?}"),
    }

    let empty = Cart::new();
    let empty_request = CheckoutRequest {
        cart: &empty,
        ..request.clone()
    };
    ensure!(
        matches!(
            store.checkout(&empty_request, &MockGateway::approving()),
            Err(CheckoutError::EmptyCart)
        ),
        "empty cart should be rejected"
    );

    let bad_billing = BillingDetails {
        email: "not-an-email".to_string(),
        ..billing.clone()
    };
    let bad_request = CheckoutRequest {
        billing: &bad_billing,
        ..request
    };
    ensure!(
        matches!(
            store.checkout(&bad_request, &MockGateway::approving()),
            Err(CheckoutError::Invalid(_))
        ),
        "invalid email should be rejected"
    );
    Ok(())
}
