use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use storefront_core::{DomainError, OrderId};
use storefront_orders::{Order, PlaceOrder, place_order};

use crate::repository::OrderRepository;
use crate::services::ServiceResult;

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// Price the request and persist order plus items as one unit.
    ///
    /// Nothing is written when validation or pricing fails.
    #[instrument(skip(self, cmd), fields(item_count = cmd.items.len()), err)]
    pub async fn place_order(&self, cmd: PlaceOrder) -> ServiceResult<Order> {
        let order = place_order(cmd, Utc::now())?;
        self.orders.insert_order(&order).await?;

        info!(
            order_id = %order.id,
            total_amount = %order.total_amount,
            "order placed"
        );
        Ok(order)
    }

    pub async fn order(&self, id: OrderId) -> ServiceResult<Order> {
        self.orders
            .find_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order").into())
    }

    pub async fn list_orders(&self) -> ServiceResult<Vec<Order>> {
        Ok(self.orders.list_orders().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use storefront_orders::LineItemRequest;

    use crate::InMemoryDatabase;
    use crate::services::ServiceError;

    fn line(name: &str, cents: i64, quantity: i64) -> LineItemRequest {
        LineItemRequest {
            product_name: name.to_string(),
            product_price: Decimal::new(cents, 2),
            quantity,
        }
    }

    fn cmd(items: Vec<LineItemRequest>) -> PlaceOrder {
        PlaceOrder {
            customer_name: "John Doe".to_string(),
            customer_email: "john@example.com".to_string(),
            items,
        }
    }

    #[tokio::test]
    async fn placed_order_is_readable_with_items() {
        let svc = OrderService::new(Arc::new(InMemoryDatabase::new()));
        let placed = svc
            .place_order(cmd(vec![
                line("Spotify Premium", 999, 1),
                line("ChatGPT Plus", 2000, 1),
            ]))
            .await
            .unwrap();
        assert_eq!(placed.total_amount.to_string(), "29.99");

        let loaded = svc.order(placed.id).await.unwrap();
        assert_eq!(loaded, placed);
        assert_eq!(loaded.items.len(), 2);
    }

    #[tokio::test]
    async fn rejected_order_persists_nothing() {
        let svc = OrderService::new(Arc::new(InMemoryDatabase::new()));
        let err = svc
            .place_order(cmd(vec![line("Spotify Premium", 999, 1), line("Broken", 100, 0)]))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidField { .. })));
        assert!(svc.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let svc = OrderService::new(Arc::new(InMemoryDatabase::new()));
        assert!(matches!(
            svc.order(OrderId::new()).await,
            Err(ServiceError::Domain(DomainError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn orders_list_newest_first() {
        let svc = OrderService::new(Arc::new(InMemoryDatabase::new()));
        let first = svc.place_order(cmd(vec![line("A", 100, 1)])).await.unwrap();
        let second = svc.place_order(cmd(vec![line("B", 100, 1)])).await.unwrap();

        let ids: Vec<OrderId> = svc.list_orders().await.unwrap().iter().map(|o| o.id).collect();
        assert_eq!(ids, [second.id, first.id]);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn stored_total_is_sum_of_price_times_quantity(
            lines in prop::collection::vec((0i64..1_000_000, 1i64..50), 1..8)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let svc = OrderService::new(Arc::new(InMemoryDatabase::new()));
            let items: Vec<_> = lines
                .iter()
                .enumerate()
                .map(|(i, &(cents, qty))| line(&format!("Item {i}"), cents, qty))
                .collect();
            let expected: Decimal = lines
                .iter()
                .map(|&(cents, qty)| Decimal::new(cents, 2) * Decimal::from(qty))
                .sum();

            let (placed, loaded) = rt.block_on(async {
                let placed = svc.place_order(cmd(items)).await.unwrap();
                let loaded = svc.order(placed.id).await.unwrap();
                (placed, loaded)
            });

            prop_assert_eq!(&loaded, &placed);
            prop_assert_eq!(loaded.total_amount.amount(), expected);
            prop_assert_eq!(loaded.items.len(), lines.len());
            let subtotals: Decimal = loaded.items.iter().map(|i| i.subtotal.amount()).sum();
            prop_assert_eq!(subtotals, expected);
        }
    }
}
