use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::validation::{require_email, require_max_len, require_non_blank};
use storefront_core::{DomainError, DomainResult, Entity, Money, OrderId, OrderItemId};

pub const MAX_CUSTOMER_NAME_LEN: usize = 200;
pub const MAX_PRODUCT_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;
const MAX_QUANTITY: i64 = i32::MAX as i64;

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown order status '{other}'"))),
        }
    }
}

/// Order line: a snapshot of the product name and price at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_name: String,
    pub product_price: Money,
    pub quantity: u32,
    /// `product_price * quantity`, computed once when the order is placed.
    pub subtotal: Money,
}

/// A placed order and its lines.
///
/// Invariant: `total_amount` is the exact sum of the item subtotals. It is
/// fixed when the order is placed and never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub customer_email: String,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of the stored item subtotals.
    pub fn items_total(&self) -> DomainResult<Money> {
        self.items.iter().try_fold(Money::ZERO, |acc, item| {
            acc.checked_add(item.subtotal)
                .map_err(|e| DomainError::field("total_amount", e.to_string()))
        })
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One requested line, as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineItemRequest {
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i64,
}

/// Command: PlaceOrder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaceOrder {
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<LineItemRequest>,
}

/// Validate a placement request and price it.
///
/// Every field is checked before any amount is computed, so a rejected
/// request never yields a partially priced order. Subtotals are computed in
/// input order and the total is their running sum.
pub fn place_order(cmd: PlaceOrder, now: DateTime<Utc>) -> DomainResult<Order> {
    require_non_blank("customer_name", &cmd.customer_name)?;
    require_max_len("customer_name", &cmd.customer_name, MAX_CUSTOMER_NAME_LEN)?;
    require_non_blank("customer_email", &cmd.customer_email)?;
    require_max_len("customer_email", &cmd.customer_email, MAX_EMAIL_LEN)?;
    require_email("customer_email", &cmd.customer_email)?;

    if cmd.items.is_empty() {
        return Err(DomainError::field("items", "An order needs at least one item."));
    }

    let mut validated = Vec::with_capacity(cmd.items.len());
    for (idx, line) in cmd.items.into_iter().enumerate() {
        validated.push(validate_line(idx, line)?);
    }

    let mut total = Money::ZERO;
    let mut items = Vec::with_capacity(validated.len());
    for (idx, (product_name, product_price, quantity)) in validated.into_iter().enumerate() {
        let subtotal = product_price
            .times(quantity)
            .map_err(|e| DomainError::field(format!("items[{idx}].subtotal"), e.to_string()))?;
        total = total
            .checked_add(subtotal)
            .map_err(|e| DomainError::field("total_amount", e.to_string()))?;

        items.push(OrderItem {
            id: OrderItemId::new(),
            product_name,
            product_price,
            quantity,
            subtotal,
        });
    }

    Ok(Order {
        id: OrderId::new(),
        customer_name: cmd.customer_name,
        customer_email: cmd.customer_email,
        total_amount: total,
        status: OrderStatus::Pending,
        items,
        created_at: now,
        updated_at: now,
    })
}

fn validate_line(idx: usize, line: LineItemRequest) -> DomainResult<(String, Money, u32)> {
    let field = |name: &str| format!("items[{idx}].{name}");

    require_non_blank(&field("product_name"), &line.product_name)?;
    require_max_len(&field("product_name"), &line.product_name, MAX_PRODUCT_NAME_LEN)?;

    let price = Money::try_new(line.product_price)
        .map_err(|e| DomainError::field(field("product_price"), e.to_string()))?;

    if line.quantity < 1 {
        return Err(DomainError::field(
            field("quantity"),
            "Ensure this value is greater than or equal to 1.",
        ));
    }
    if line.quantity > MAX_QUANTITY {
        return Err(DomainError::field(
            field("quantity"),
            format!("Ensure this value is less than or equal to {MAX_QUANTITY}."),
        ));
    }

    Ok((line.product_name, price, line.quantity as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(name: &str, price: &str, quantity: i64) -> LineItemRequest {
        LineItemRequest {
            product_name: name.to_string(),
            product_price: price.parse().unwrap(),
            quantity,
        }
    }

    fn cmd(items: Vec<LineItemRequest>) -> PlaceOrder {
        PlaceOrder {
            customer_name: "Jane Doe".to_string(),
            customer_email: "jane@example.com".to_string(),
            items,
        }
    }

    #[test]
    fn place_order_sums_subtotals() {
        let order = place_order(
            cmd(vec![
                line("Spotify Premium", "9.99", 1),
                line("ChatGPT Plus", "20.00", 1),
            ]),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(order.total_amount.to_string(), "29.99");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].product_name, "Spotify Premium");
        assert_eq!(order.items[1].subtotal.to_string(), "20.00");
    }

    #[test]
    fn subtotal_multiplies_by_quantity() {
        let order = place_order(cmd(vec![line("Spotify Premium", "9.99", 3)]), Utc::now()).unwrap();
        assert_eq!(order.items[0].subtotal.to_string(), "29.97");
        assert_eq!(order.total_amount.to_string(), "29.97");
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let err = place_order(cmd(vec![]), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidField { ref field, .. } if field == "items"));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let err = place_order(
            cmd(vec![line("Spotify Premium", "9.99", 1), line("ChatGPT Plus", "20.00", 0)]),
            Utc::now(),
        )
        .unwrap_err();
        assert!(
            matches!(err, DomainError::InvalidField { ref field, .. } if field == "items[1].quantity")
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = place_order(cmd(vec![line("Refund", "-1.00", 1)]), Utc::now()).unwrap_err();
        assert!(
            matches!(err, DomainError::InvalidField { ref field, .. } if field == "items[0].product_price")
        );
    }

    #[test]
    fn sub_cent_price_is_rejected_not_rounded() {
        assert!(place_order(cmd(vec![line("Gas", "1.999", 1)]), Utc::now()).is_err());
    }

    #[test]
    fn invalid_customer_email_is_rejected() {
        let mut c = cmd(vec![line("Spotify Premium", "9.99", 1)]);
        c.customer_email = "jane".to_string();
        let err = place_order(c, Utc::now()).unwrap_err();
        assert!(
            matches!(err, DomainError::InvalidField { ref field, .. } if field == "customer_email")
        );
    }

    #[test]
    fn zero_price_lines_are_allowed() {
        let order = place_order(cmd(vec![line("Free Trial", "0", 2)]), Utc::now()).unwrap();
        assert_eq!(order.total_amount, Money::ZERO);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn order_serializes_amounts_as_strings() {
        let order = place_order(cmd(vec![line("Spotify Premium", "9.99", 1)]), Utc::now()).unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["total_amount"], "9.99");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["product_price"], "9.99");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the total is the exact decimal sum of price * quantity,
        /// and every stored subtotal matches its own line.
        #[test]
        fn total_is_exact_sum_of_lines(
            lines in prop::collection::vec((0i64..100_000i64, 1i64..50i64), 1..20)
        ) {
            let items = lines
                .iter()
                .enumerate()
                .map(|(i, (cents, qty))| LineItemRequest {
                    product_name: format!("item {i}"),
                    product_price: Decimal::new(*cents, 2),
                    quantity: *qty,
                })
                .collect();

            let order = place_order(cmd(items), Utc::now()).unwrap();

            let expected_cents: i64 = lines.iter().map(|(c, q)| c * q).sum();
            prop_assert_eq!(order.total_amount.amount(), Decimal::new(expected_cents, 2));
            prop_assert_eq!(order.items.len(), lines.len());
            for (item, (cents, qty)) in order.items.iter().zip(lines.iter()) {
                prop_assert_eq!(item.subtotal.amount(), Decimal::new(cents * qty, 2));
            }
            prop_assert_eq!(order.items_total().unwrap(), order.total_amount);
        }
    }
}
