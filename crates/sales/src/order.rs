use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, OrderId, OrderItemId, UserId, VariantId};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(format!("unknown order status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cod,
    Online,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Online => "online",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "online" => Ok(Self::Online),
            other => Err(DomainError::validation(format!("unknown payment method '{other}'"))),
        }
    }
}

/// Customer order header. Line items live in [`OrderItem`] rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub staff_id: Option<UserId>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

/// Order line with the unit price captured when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub variant_id: VariantId,
    pub quantity: i64,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineDraft {
    pub variant_id: VariantId,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_id: UserId,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderLineDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    #[serde(default)]
    pub staff_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.items.is_empty() {
            return Err(DomainError::validation("an order needs at least one item"));
        }
        if let Some(line) = self.items.iter().find(|l| l.quantity <= 0) {
            return Err(DomainError::validation(format!(
                "quantity for variant {} must be greater than zero",
                line.variant_id
            )));
        }
        Ok(())
    }
}

impl Order {
    /// New pending order. The total is filled in by [`Order::set_items_total`].
    pub fn new(id: OrderId, draft: &OrderDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            customer_id: draft.customer_id,
            staff_id: None,
            status: OrderStatus::Pending,
            payment_method: draft.payment_method,
            total: 0,
            created_at: now,
        })
    }

    pub fn set_items_total(&mut self, items: &[OrderItem]) -> DomainResult<()> {
        self.total = items.iter().try_fold(0i64, |acc, item| {
            item.line_total()
                .and_then(|line| acc.checked_add(line))
                .ok_or_else(|| DomainError::validation("order total overflows"))
        })?;
        Ok(())
    }

    /// Status changes are stock-neutral.
    pub fn update_status(&mut self, update: OrderStatusUpdate) {
        self.status = update.status;
        if update.staff_id.is_some() {
            self.staff_id = update.staff_id;
        }
    }

    pub fn label(&self) -> String {
        format!("Order #{}", self.id)
    }
}

impl OrderItem {
    pub fn new(order_id: OrderId, variant_id: VariantId, quantity: i64, price: i64) -> Self {
        Self {
            id: OrderItemId::new(),
            order_id,
            variant_id,
            quantity,
            price,
        }
    }

    pub fn line_total(&self) -> Option<i64> {
        self.quantity.checked_mul(self.price)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> OrderItemId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_draft(lines: &[(VariantId, i64)]) -> OrderDraft {
        OrderDraft {
            customer_id: UserId::new(),
            payment_method: PaymentMethod::default(),
            items: lines
                .iter()
                .map(|(variant_id, quantity)| OrderLineDraft {
                    variant_id: *variant_id,
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn new_orders_are_pending_cod() {
        let order = Order::new(OrderId::new(), &test_draft(&[(VariantId::new(), 1)]), Utc::now()).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, PaymentMethod::Cod);
    }

    #[test]
    fn empty_or_non_positive_lines_are_rejected() {
        assert!(test_draft(&[]).validate().is_err());
        assert!(test_draft(&[(VariantId::new(), 0)]).validate().is_err());
    }

    #[test]
    fn total_sums_captured_prices() {
        let mut order = Order::new(OrderId::new(), &test_draft(&[(VariantId::new(), 1)]), Utc::now()).unwrap();
        let items = vec![
            OrderItem::new(order.id, VariantId::new(), 2, 1_500),
            OrderItem::new(order.id, VariantId::new(), 1, 999),
        ];
        order.set_items_total(&items).unwrap();
        assert_eq!(order.total, 3_999);
    }

    #[test]
    fn status_update_keeps_staff_when_absent() {
        let mut order = Order::new(OrderId::new(), &test_draft(&[(VariantId::new(), 1)]), Utc::now()).unwrap();
        let staff = UserId::new();
        order.update_status(OrderStatusUpdate { status: OrderStatus::Confirmed, staff_id: Some(staff) });
        order.update_status(OrderStatusUpdate { status: OrderStatus::Shipped, staff_id: None });
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.staff_id, Some(staff));
    }

    #[test]
    fn status_parses_from_query_strings() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_value(OrderStatus::Cancelled).unwrap(), "cancelled");
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn total_is_sum_of_lines(lines in prop::collection::vec((1i64..50, 0i64..10_000), 1..10)) {
            let order_id = OrderId::new();
            let items: Vec<_> = lines
                .iter()
                .map(|(q, p)| OrderItem::new(order_id, VariantId::new(), *q, *p))
                .collect();
            let mut order = Order::new(order_id, &test_draft(&[(VariantId::new(), 1)]), Utc::now()).unwrap();
            order.set_items_total(&items).unwrap();
            prop_assert_eq!(order.total, lines.iter().map(|(q, p)| q * p).sum::<i64>());
        }
    }
}
