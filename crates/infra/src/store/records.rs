//! Table mappings for every persisted domain record.

use stockroom_auth::{LoginLog, User};
use stockroom_inventory::InventoryLogEntry;
use stockroom_parties::Supplier;
use stockroom_products::{Category, Product, Variant};
use stockroom_purchasing::Purchase;
use stockroom_sales::{Order, OrderItem};

use super::record::{ColumnType as C, Record, Row, SortOrder, Value};
use super::StoreResult;

impl Record for Category {
    const TABLE: &'static str = "categories";
    const NOUN: &'static str = "category";
    const COLUMNS: &'static [(&'static str, C)] = &[
        ("id", C::Uuid),
        ("name", C::Text),
        ("group_name", C::Text),
        ("created_at", C::Timestamp),
    ];
    const UNIQUE: &'static [&'static str] = &["name"];
    const ORDER_BY: (&'static str, SortOrder) = ("name", SortOrder::Asc);

    fn to_row(&self) -> Row {
        Row::new(Self::TABLE)
            .with("id", Value::id(self.id))
            .with("name", self.name.as_str())
            .with("group_name", self.group.as_str())
            .with("created_at", self.created_at)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.id("id")?,
            name: row.text("name")?,
            group: row.parse("group_name")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

impl Record for Product {
    const TABLE: &'static str = "products";
    const NOUN: &'static str = "product";
    const COLUMNS: &'static [(&'static str, C)] = &[
        ("id", C::Uuid),
        ("name", C::Text),
        ("description", C::Text),
        ("category_id", C::Uuid),
        ("image", C::Text),
        ("price", C::Int),
        ("discount", C::Int),
        ("discounted_price", C::Int),
        ("created_at", C::Timestamp),
    ];
    const ORDER_BY: (&'static str, SortOrder) = ("created_at", SortOrder::Desc);

    fn to_row(&self) -> Row {
        Row::new(Self::TABLE)
            .with("id", Value::id(self.id))
            .with("name", self.name.as_str())
            .with("description", self.description.as_str())
            .with("category_id", Value::id(self.category_id))
            .with("image", self.image.as_str())
            .with("price", self.price)
            .with("discount", self.discount)
            .with("discounted_price", self.discounted_price)
            .with("created_at", self.created_at)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.id("id")?,
            name: row.text("name")?,
            description: row.text("description")?,
            category_id: row.id("category_id")?,
            image: row.text("image")?,
            price: row.int("price")?,
            discount: row.int("discount")?,
            discounted_price: row.int("discounted_price")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

impl Record for Variant {
    const TABLE: &'static str = "product_variants";
    const NOUN: &'static str = "variant";
    const COLUMNS: &'static [(&'static str, C)] = &[
        ("id", C::Uuid),
        ("product_id", C::Uuid),
        ("size", C::Text),
        ("color", C::Text),
        ("price", C::Int),
        ("stock", C::Int),
        ("sku", C::Text),
        ("image", C::Text),
    ];
    const UNIQUE: &'static [&'static str] = &["sku"];
    const ORDER_BY: (&'static str, SortOrder) = ("sku", SortOrder::Asc);

    fn to_row(&self) -> Row {
        Row::new(Self::TABLE)
            .with("id", Value::id(self.id))
            .with("product_id", Value::id(self.product_id))
            .with("size", self.size.as_str())
            .with("color", self.color.as_str())
            .with("price", self.price)
            .with("stock", self.stock)
            .with("sku", self.sku.as_str())
            .with("image", self.image.as_str())
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.id("id")?,
            product_id: row.id("product_id")?,
            size: row.text("size")?,
            color: row.text("color")?,
            price: row.int("price")?,
            stock: row.int("stock")?,
            sku: row.text("sku")?,
            image: row.text("image")?,
        })
    }
}

impl Record for Supplier {
    const TABLE: &'static str = "suppliers";
    const NOUN: &'static str = "supplier";
    const COLUMNS: &'static [(&'static str, C)] = &[
        ("id", C::Uuid),
        ("name", C::Text),
        ("phone", C::Text),
        ("email", C::Text),
        ("address", C::Text),
        ("created_at", C::Timestamp),
    ];
    const ORDER_BY: (&'static str, SortOrder) = ("name", SortOrder::Asc);

    fn to_row(&self) -> Row {
        Row::new(Self::TABLE)
            .with("id", Value::id(self.id))
            .with("name", self.name.as_str())
            .with("phone", self.phone.as_str())
            .with("email", self.email.as_str())
            .with("address", self.address.as_str())
            .with("created_at", self.created_at)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.id("id")?,
            name: row.text("name")?,
            phone: row.text("phone")?,
            email: row.text("email")?,
            address: row.text("address")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

impl Record for Purchase {
    const TABLE: &'static str = "purchases";
    const NOUN: &'static str = "purchase";
    const COLUMNS: &'static [(&'static str, C)] = &[
        ("id", C::Uuid),
        ("supplier_id", C::Uuid),
        ("staff_id", C::NullableUuid),
        ("variant_id", C::Uuid),
        ("quantity", C::Int),
        ("cost_price", C::Int),
        ("total", C::Int),
        ("created_at", C::Timestamp),
    ];
    const ORDER_BY: (&'static str, SortOrder) = ("created_at", SortOrder::Desc);

    fn to_row(&self) -> Row {
        Row::new(Self::TABLE)
            .with("id", Value::id(self.id))
            .with("supplier_id", Value::id(self.supplier_id))
            .with("staff_id", Value::opt_id(self.staff_id))
            .with("variant_id", Value::id(self.variant_id))
            .with("quantity", self.quantity)
            .with("cost_price", self.cost_price)
            .with("total", self.total)
            .with("created_at", self.created_at)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.id("id")?,
            supplier_id: row.id("supplier_id")?,
            staff_id: row.opt_id("staff_id")?,
            variant_id: row.id("variant_id")?,
            quantity: row.int("quantity")?,
            cost_price: row.int("cost_price")?,
            total: row.int("total")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

impl Record for InventoryLogEntry {
    const TABLE: &'static str = "inventory_logs";
    const NOUN: &'static str = "inventory log";
    const COLUMNS: &'static [(&'static str, C)] = &[
        ("id", C::Uuid),
        ("variant_id", C::Uuid),
        ("change_type", C::Text),
        ("quantity", C::Int),
        ("note", C::Text),
        ("purchase_id", C::NullableUuid),
        ("created_at", C::Timestamp),
    ];
    const ORDER_BY: (&'static str, SortOrder) = ("created_at", SortOrder::Desc);

    fn to_row(&self) -> Row {
        Row::new(Self::TABLE)
            .with("id", Value::id(self.id))
            .with("variant_id", Value::id(self.variant_id))
            .with("change_type", self.change_type.as_str())
            .with("quantity", self.quantity)
            .with("note", self.note.as_str())
            .with("purchase_id", Value::opt_id(self.purchase_id))
            .with("created_at", self.created_at)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.id("id")?,
            variant_id: row.id("variant_id")?,
            change_type: row.parse("change_type")?,
            quantity: row.int("quantity")?,
            note: row.text("note")?,
            purchase_id: row.opt_id("purchase_id")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

impl Record for Order {
    const TABLE: &'static str = "orders";
    const NOUN: &'static str = "order";
    const COLUMNS: &'static [(&'static str, C)] = &[
        ("id", C::Uuid),
        ("customer_id", C::Uuid),
        ("staff_id", C::NullableUuid),
        ("status", C::Text),
        ("payment_method", C::Text),
        ("total", C::Int),
        ("created_at", C::Timestamp),
    ];
    const ORDER_BY: (&'static str, SortOrder) = ("created_at", SortOrder::Desc);

    fn to_row(&self) -> Row {
        Row::new(Self::TABLE)
            .with("id", Value::id(self.id))
            .with("customer_id", Value::id(self.customer_id))
            .with("staff_id", Value::opt_id(self.staff_id))
            .with("status", self.status.as_str())
            .with("payment_method", self.payment_method.as_str())
            .with("total", self.total)
            .with("created_at", self.created_at)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.id("id")?,
            customer_id: row.id("customer_id")?,
            staff_id: row.opt_id("staff_id")?,
            status: row.parse("status")?,
            payment_method: row.parse("payment_method")?,
            total: row.int("total")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}

impl Record for OrderItem {
    const TABLE: &'static str = "order_items";
    const NOUN: &'static str = "order item";
    const COLUMNS: &'static [(&'static str, C)] = &[
        ("id", C::Uuid),
        ("order_id", C::Uuid),
        ("variant_id", C::Uuid),
        ("quantity", C::Int),
        ("price", C::Int),
    ];

    fn to_row(&self) -> Row {
        Row::new(Self::TABLE)
            .with("id", Value::id(self.id))
            .with("order_id", Value::id(self.order_id))
            .with("variant_id", Value::id(self.variant_id))
            .with("quantity", self.quantity)
            .with("price", self.price)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.id("id")?,
            order_id: row.id("order_id")?,
            variant_id: row.id("variant_id")?,
            quantity: row.int("quantity")?,
            price: row.int("price")?,
        })
    }
}

impl Record for User {
    const TABLE: &'static str = "users";
    const NOUN: &'static str = "user";
    const COLUMNS: &'static [(&'static str, C)] = &[
        ("id", C::Uuid),
        ("username", C::Text),
        ("email", C::Text),
        ("password_hash", C::Text),
        ("role", C::Text),
        ("phone", C::Text),
        ("address", C::Text),
        ("created_at", C::Timestamp),
        ("updated_at", C::Timestamp),
    ];
    const UNIQUE: &'static [&'static str] = &["username", "email"];
    const ORDER_BY: (&'static str, SortOrder) = ("username", SortOrder::Asc);

    fn to_row(&self) -> Row {
        Row::new(Self::TABLE)
            .with("id", Value::id(self.id))
            .with("username", self.username.as_str())
            .with("email", self.email.as_str())
            .with("password_hash", self.password_hash.as_str())
            .with("role", self.role.as_str())
            .with("phone", self.phone.as_str())
            .with("address", self.address.as_str())
            .with("created_at", self.created_at)
            .with("updated_at", self.updated_at)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.id("id")?,
            username: row.text("username")?,
            email: row.text("email")?,
            password_hash: row.text("password_hash")?,
            role: row.parse("role")?,
            phone: row.text("phone")?,
            address: row.text("address")?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }
}

impl Record for LoginLog {
    const TABLE: &'static str = "login_logs";
    const NOUN: &'static str = "login log";
    const COLUMNS: &'static [(&'static str, C)] = &[
        ("id", C::Uuid),
        ("user_id", C::NullableUuid),
        ("role", C::NullableText),
        ("ip", C::Text),
        ("user_agent", C::Text),
        ("status", C::Text),
        ("message", C::Text),
        ("created_at", C::Timestamp),
    ];
    const ORDER_BY: (&'static str, SortOrder) = ("created_at", SortOrder::Desc);

    fn to_row(&self) -> Row {
        Row::new(Self::TABLE)
            .with("id", Value::id(self.id))
            .with("user_id", Value::opt_id(self.user_id))
            .with("role", Value::opt_text(self.role.map(|r| r.as_str())))
            .with("ip", self.ip.as_str())
            .with("user_agent", self.user_agent.as_str())
            .with("status", self.status.as_str())
            .with("message", self.message.as_str())
            .with("created_at", self.created_at)
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Self {
            id: row.id("id")?,
            user_id: row.opt_id("user_id")?,
            role: row.opt_parse("role")?,
            ip: row.text("ip")?,
            user_agent: row.text("user_agent")?,
            status: row.parse("status")?,
            message: row.text("message")?,
            created_at: row.timestamp("created_at")?,
        })
    }
}
