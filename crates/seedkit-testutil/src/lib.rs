//! Hand-built [`DatabaseSchema`] fixtures shared across the workspace's test
//! suites, so every crate exercises the same realistic shapes — a
//! multi-table billing schema with a self-referencing category tree, and a
//! schema with a genuine FK cycle — instead of each test file inventing its
//! own ad hoc schema.

use seedkit_core::schema::types::*;

/// A small subscription-billing schema: customers, a self-referencing
/// product group tree, products, purchases and purchase line items.
pub fn billing_schema() -> DatabaseSchema {
    let mut schema = DatabaseSchema::new(DatabaseType::PostgreSQL, "test_billing".to_string());

    // customers table
    let mut customers = Table::new("customers".to_string());
    let mut id = Column::new("id".to_string(), DataType::Serial, "serial".to_string());
    id.is_auto_increment = true;
    id.nullable = false;
    customers.columns.insert("id".to_string(), id);

    let mut email = Column::new(
        "email".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    email.nullable = false;
    email.max_length = Some(255);
    customers.columns.insert("email".to_string(), email);

    let mut first_name = Column::new(
        "first_name".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    first_name.max_length = Some(100);
    customers.columns.insert("first_name".to_string(), first_name);

    let mut last_name = Column::new(
        "last_name".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    last_name.max_length = Some(100);
    customers.columns.insert("last_name".to_string(), last_name);

    let password_hash = Column::new(
        "password_hash".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    customers
        .columns
        .insert("password_hash".to_string(), password_hash);

    let mut is_active = Column::new(
        "is_active".to_string(),
        DataType::Boolean,
        "boolean".to_string(),
    );
    is_active.has_default = true;
    customers.columns.insert("is_active".to_string(), is_active);

    let created_at = Column::new(
        "created_at".to_string(),
        DataType::TimestampTz,
        "timestamp with time zone".to_string(),
    );
    customers.columns.insert("created_at".to_string(), created_at);

    let updated_at = Column::new(
        "updated_at".to_string(),
        DataType::TimestampTz,
        "timestamp with time zone".to_string(),
    );
    customers.columns.insert("updated_at".to_string(), updated_at);

    customers.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_string()],
        name: Some("customers_pkey".to_string()),
    });
    customers.unique_constraints.push(UniqueConstraint {
        name: Some("customers_email_key".to_string()),
        columns: vec!["email".to_string()],
    });

    schema.tables.insert("customers".to_string(), customers);

    // product_groups table
    let mut product_groups = Table::new("product_groups".to_string());
    let mut cat_id = Column::new("id".to_string(), DataType::Serial, "serial".to_string());
    cat_id.is_auto_increment = true;
    cat_id.nullable = false;
    product_groups.columns.insert("id".to_string(), cat_id);

    let mut cat_name = Column::new(
        "name".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    cat_name.nullable = false;
    product_groups.columns.insert("name".to_string(), cat_name);

    let slug = Column::new(
        "slug".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    product_groups.columns.insert("slug".to_string(), slug);

    let mut parent_id = Column::new(
        "parent_id".to_string(),
        DataType::Integer,
        "integer".to_string(),
    );
    parent_id.nullable = true;
    product_groups
        .columns
        .insert("parent_id".to_string(), parent_id);

    product_groups.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_string()],
        name: Some("product_groups_pkey".to_string()),
    });
    product_groups.foreign_keys.push(ForeignKey {
        name: Some("product_groups_parent_id_fkey".to_string()),
        source_columns: vec!["parent_id".to_string()],
        referenced_table: "product_groups".to_string(),
        referenced_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::SetNull,
        on_update: ForeignKeyAction::NoAction,
        is_deferrable: false,
        unique_on_fk: false,
    });

    schema.tables.insert("product_groups".to_string(), product_groups);

    // products table
    let mut products = Table::new("products".to_string());
    let mut prod_id = Column::new("id".to_string(), DataType::Serial, "serial".to_string());
    prod_id.is_auto_increment = true;
    prod_id.nullable = false;
    products.columns.insert("id".to_string(), prod_id);

    let mut prod_name = Column::new(
        "name".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    prod_name.nullable = false;
    products.columns.insert("name".to_string(), prod_name);

    let description = Column::new(
        "description".to_string(),
        DataType::Text,
        "text".to_string(),
    );
    products
        .columns
        .insert("description".to_string(), description);

    let mut price = Column::new(
        "price".to_string(),
        DataType::Numeric,
        "numeric".to_string(),
    );
    price.nullable = false;
    products.columns.insert("price".to_string(), price);

    let mut prod_cat_id = Column::new(
        "product_group_id".to_string(),
        DataType::Integer,
        "integer".to_string(),
    );
    prod_cat_id.nullable = true;
    products
        .columns
        .insert("product_group_id".to_string(), prod_cat_id);

    let sku = Column::new(
        "sku".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    products.columns.insert("sku".to_string(), sku);

    let image_url = Column::new(
        "image_url".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    products.columns.insert("image_url".to_string(), image_url);

    products.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_string()],
        name: Some("products_pkey".to_string()),
    });
    products.foreign_keys.push(ForeignKey {
        name: Some("products_product_group_id_fkey".to_string()),
        source_columns: vec!["product_group_id".to_string()],
        referenced_table: "product_groups".to_string(),
        referenced_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::SetNull,
        on_update: ForeignKeyAction::NoAction,
        is_deferrable: false,
        unique_on_fk: false,
    });
    products.unique_constraints.push(UniqueConstraint {
        name: Some("products_sku_key".to_string()),
        columns: vec!["sku".to_string()],
    });
    products.check_constraints.push(CheckConstraint {
        name: Some("products_price_check".to_string()),
        expression: "(price >= 0)".to_string(),
    });

    schema.tables.insert("products".to_string(), products);

    // purchases table
    let mut purchases = Table::new("purchases".to_string());
    let mut ord_id = Column::new("id".to_string(), DataType::Serial, "serial".to_string());
    ord_id.is_auto_increment = true;
    ord_id.nullable = false;
    purchases.columns.insert("id".to_string(), ord_id);

    let mut ord_user_id = Column::new(
        "customer_id".to_string(),
        DataType::Integer,
        "integer".to_string(),
    );
    ord_user_id.nullable = false;
    purchases.columns.insert("customer_id".to_string(), ord_user_id);

    let mut status = Column::new(
        "status".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    status.nullable = false;
    purchases.columns.insert("status".to_string(), status);

    let total = Column::new(
        "total".to_string(),
        DataType::Numeric,
        "numeric".to_string(),
    );
    purchases.columns.insert("total".to_string(), total);

    let purchase_number = Column::new(
        "purchase_number".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    purchases
        .columns
        .insert("purchase_number".to_string(), purchase_number);

    let created_at = Column::new(
        "created_at".to_string(),
        DataType::TimestampTz,
        "timestamp with time zone".to_string(),
    );
    purchases.columns.insert("created_at".to_string(), created_at);

    purchases.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_string()],
        name: Some("purchases_pkey".to_string()),
    });
    purchases.foreign_keys.push(ForeignKey {
        name: Some("purchases_customer_id_fkey".to_string()),
        source_columns: vec!["customer_id".to_string()],
        referenced_table: "customers".to_string(),
        referenced_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::Cascade,
        on_update: ForeignKeyAction::NoAction,
        is_deferrable: false,
        unique_on_fk: false,
    });

    schema.tables.insert("purchases".to_string(), purchases);

    // purchase_items table
    let mut purchase_items = Table::new("purchase_items".to_string());
    let mut oi_id = Column::new("id".to_string(), DataType::Serial, "serial".to_string());
    oi_id.is_auto_increment = true;
    oi_id.nullable = false;
    purchase_items.columns.insert("id".to_string(), oi_id);

    let mut oi_order_id = Column::new(
        "purchase_id".to_string(),
        DataType::Integer,
        "integer".to_string(),
    );
    oi_order_id.nullable = false;
    purchase_items
        .columns
        .insert("purchase_id".to_string(), oi_order_id);

    let mut oi_product_id = Column::new(
        "product_id".to_string(),
        DataType::Integer,
        "integer".to_string(),
    );
    oi_product_id.nullable = false;
    purchase_items
        .columns
        .insert("product_id".to_string(), oi_product_id);

    let mut quantity = Column::new(
        "quantity".to_string(),
        DataType::Integer,
        "integer".to_string(),
    );
    quantity.nullable = false;
    purchase_items.columns.insert("quantity".to_string(), quantity);

    let unit_price = Column::new(
        "unit_price".to_string(),
        DataType::Numeric,
        "numeric".to_string(),
    );
    purchase_items
        .columns
        .insert("unit_price".to_string(), unit_price);

    purchase_items.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_string()],
        name: Some("purchase_items_pkey".to_string()),
    });
    purchase_items.foreign_keys.push(ForeignKey {
        name: Some("purchase_items_purchase_id_fkey".to_string()),
        source_columns: vec!["purchase_id".to_string()],
        referenced_table: "purchases".to_string(),
        referenced_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::Cascade,
        on_update: ForeignKeyAction::NoAction,
        is_deferrable: false,
        unique_on_fk: false,
    });
    purchase_items.foreign_keys.push(ForeignKey {
        name: Some("purchase_items_product_id_fkey".to_string()),
        source_columns: vec!["product_id".to_string()],
        referenced_table: "products".to_string(),
        referenced_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::Cascade,
        on_update: ForeignKeyAction::NoAction,
        is_deferrable: false,
        unique_on_fk: false,
    });
    purchase_items.check_constraints.push(CheckConstraint {
        name: Some("purchase_items_quantity_check".to_string()),
        expression: "(quantity > 0)".to_string(),
    });

    schema.tables.insert("purchase_items".to_string(), purchase_items);

    schema
}

/// A schema with a genuine FK cycle: `staff.manager_id -> staff.id`
/// (self-referencing) and `teams.head_id -> staff.id`, with `staff` having
/// no FK into `teams` — so a plain topological sort can still place `staff`
/// before `teams`, but `staff`'s self-reference still needs cycle handling.
pub fn org_chart_schema() -> DatabaseSchema {
    let mut schema = DatabaseSchema::new(DatabaseType::PostgreSQL, "test_circular".to_string());

    // staff table — manager_id references staff.id (self-referencing)
    let mut staff = Table::new("staff".to_string());
    let mut emp_id = Column::new("id".to_string(), DataType::Serial, "serial".to_string());
    emp_id.is_auto_increment = true;
    emp_id.nullable = false;
    staff.columns.insert("id".to_string(), emp_id);

    let emp_name = Column::new(
        "name".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    staff.columns.insert("name".to_string(), emp_name);

    let mut manager_id = Column::new(
        "manager_id".to_string(),
        DataType::Integer,
        "integer".to_string(),
    );
    manager_id.nullable = true;
    staff
        .columns
        .insert("manager_id".to_string(), manager_id);

    staff.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_string()],
        name: Some("staff_pkey".to_string()),
    });
    staff.foreign_keys.push(ForeignKey {
        name: Some("staff_manager_id_fkey".to_string()),
        source_columns: vec!["manager_id".to_string()],
        referenced_table: "staff".to_string(),
        referenced_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::SetNull,
        on_update: ForeignKeyAction::NoAction,
        is_deferrable: false,
        unique_on_fk: false,
    });

    schema.tables.insert("staff".to_string(), staff);

    // teams table — head_id references staff.id
    let mut teams = Table::new("teams".to_string());
    let mut dept_id = Column::new("id".to_string(), DataType::Serial, "serial".to_string());
    dept_id.is_auto_increment = true;
    dept_id.nullable = false;
    teams.columns.insert("id".to_string(), dept_id);

    let dept_name = Column::new(
        "name".to_string(),
        DataType::VarChar,
        "character varying".to_string(),
    );
    teams.columns.insert("name".to_string(), dept_name);

    let mut head_id = Column::new(
        "head_id".to_string(),
        DataType::Integer,
        "integer".to_string(),
    );
    head_id.nullable = true;
    teams.columns.insert("head_id".to_string(), head_id);

    teams.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_string()],
        name: Some("teams_pkey".to_string()),
    });
    teams.foreign_keys.push(ForeignKey {
        name: Some("teams_head_id_fkey".to_string()),
        source_columns: vec!["head_id".to_string()],
        referenced_table: "staff".to_string(),
        referenced_columns: vec!["id".to_string()],
        on_delete: ForeignKeyAction::SetNull,
        on_update: ForeignKeyAction::NoAction,
        is_deferrable: false,
        unique_on_fk: false,
    });

    schema.tables.insert("teams".to_string(), teams);

    schema
}
