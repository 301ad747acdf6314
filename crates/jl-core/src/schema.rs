//! Supermarket relation definitions
//!
//! The four normalized relations and the flattened
//! `supermarket_transactions` relation are described as static data.
//! DDL and fixture invariant checks are both derived from these definitions.

use crate::error::{CoreError, CoreResult};
use crate::sql_utils::quote_ident;
use serde::Serialize;

/// Which side of the tutorial a relation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// One of the four related tables
    Normalized,
    /// The single flattened table
    Denormalized,
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationKind::Normalized => write!(f, "normalized"),
            RelationKind::Denormalized => write!(f, "denormalized"),
        }
    }
}

/// Value constraint attached to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnCheck {
    /// Value must be > 0
    Positive,
    /// Value must be >= 0
    NonNegative,
}

impl ColumnCheck {
    /// SQL predicate that holds for valid values of `column`
    pub fn predicate(&self, column: &str) -> String {
        match self {
            ColumnCheck::Positive => format!("{} > 0", quote_ident(column)),
            ColumnCheck::NonNegative => format!("{} >= 0", quote_ident(column)),
        }
    }
}

impl std::fmt::Display for ColumnCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnCheck::Positive => write!(f, "positive"),
            ColumnCheck::NonNegative => write!(f, "non_negative"),
        }
    }
}

/// A column of a relation
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ColumnDef {
    /// Column name
    pub name: &'static str,
    /// DuckDB column type
    pub sql_type: &'static str,
    /// Value constraint, if any
    pub check: Option<ColumnCheck>,
    /// Referenced relation (the referenced column has the same name)
    pub references: Option<&'static str>,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            check: None,
            references: None,
        }
    }

    const fn checked(mut self, check: ColumnCheck) -> Self {
        self.check = Some(check);
        self
    }

    const fn references(mut self, relation: &'static str) -> Self {
        self.references = Some(relation);
        self
    }
}

/// A relation of the fixture database
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RelationDef {
    /// Relation name
    pub name: &'static str,
    /// Normalized or denormalized
    pub kind: RelationKind,
    /// Unique key column
    pub key: &'static str,
    /// Columns in declaration order
    pub columns: &'static [ColumnDef],
}

impl RelationDef {
    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Render the CREATE TABLE statement for this relation.
    ///
    /// Normalized relations declare their key, references and checks so the
    /// engine rejects invalid fixture rows. The denormalized relation carries
    /// column types only.
    pub fn create_table_sql(&self) -> String {
        let enforce = self.kind == RelationKind::Normalized;
        let mut lines: Vec<String> = Vec::with_capacity(self.columns.len());

        for column in self.columns {
            let mut line = format!("    {} {}", quote_ident(column.name), column.sql_type);
            if enforce {
                if column.name == self.key {
                    line.push_str(" PRIMARY KEY");
                }
                if let Some(relation) = column.references {
                    line.push_str(&format!(
                        " REFERENCES {}({})",
                        quote_ident(relation),
                        quote_ident(column.name)
                    ));
                }
                if let Some(check) = column.check {
                    line.push_str(&format!(" CHECK ({})", check.predicate(column.name)));
                }
            }
            lines.push(line);
        }

        format!(
            "CREATE TABLE {} (\n{}\n)",
            quote_ident(self.name),
            lines.join(",\n")
        )
    }
}

pub const CUSTOMER: RelationDef = RelationDef {
    name: "customer",
    kind: RelationKind::Normalized,
    key: "customer_id",
    columns: &[
        ColumnDef::new("customer_id", "INTEGER"),
        ColumnDef::new("first_name", "VARCHAR"),
        ColumnDef::new("last_name", "VARCHAR"),
        ColumnDef::new("phone_number", "VARCHAR"),
        ColumnDef::new("date_of_birth", "DATE"),
    ],
};

pub const CASHIER: RelationDef = RelationDef {
    name: "cashier",
    kind: RelationKind::Normalized,
    key: "cashier_id",
    columns: &[
        ColumnDef::new("cashier_id", "INTEGER"),
        ColumnDef::new("name", "VARCHAR"),
    ],
};

pub const PRODUCT: RelationDef = RelationDef {
    name: "product",
    kind: RelationKind::Normalized,
    key: "product_id",
    columns: &[
        ColumnDef::new("product_id", "INTEGER"),
        ColumnDef::new("description", "VARCHAR"),
        ColumnDef::new("brand_name", "VARCHAR"),
        ColumnDef::new("category", "VARCHAR"),
        ColumnDef::new("unit_price", "DECIMAL(10,2)").checked(ColumnCheck::NonNegative),
    ],
};

pub const CART: RelationDef = RelationDef {
    name: "cart",
    kind: RelationKind::Normalized,
    key: "purchase_id",
    columns: &[
        ColumnDef::new("purchase_id", "INTEGER"),
        ColumnDef::new("transaction_id", "INTEGER"),
        ColumnDef::new("customer_id", "INTEGER").references("customer"),
        ColumnDef::new("cashier_id", "INTEGER").references("cashier"),
        ColumnDef::new("product_id", "INTEGER").references("product"),
        ColumnDef::new("quantity", "INTEGER").checked(ColumnCheck::Positive),
        ColumnDef::new("purchase_date", "DATE"),
        ColumnDef::new("purchase_time", "TIME"),
        ColumnDef::new("payment_method", "VARCHAR"),
        ColumnDef::new("store_location", "VARCHAR"),
        ColumnDef::new("discount_percent", "DECIMAL(5,2)"),
        ColumnDef::new("is_discounted", "BOOLEAN"),
    ],
};

pub const SUPERMARKET_TRANSACTIONS: RelationDef = RelationDef {
    name: "supermarket_transactions",
    kind: RelationKind::Denormalized,
    key: "purchase_id",
    columns: &[
        ColumnDef::new("purchase_id", "INTEGER"),
        ColumnDef::new("transaction_id", "INTEGER"),
        ColumnDef::new("customer_id", "INTEGER"),
        ColumnDef::new("first_name", "VARCHAR"),
        ColumnDef::new("last_name", "VARCHAR"),
        ColumnDef::new("phone_number", "VARCHAR"),
        ColumnDef::new("date_of_birth", "DATE"),
        ColumnDef::new("cashier_id", "INTEGER"),
        ColumnDef::new("cashier_name", "VARCHAR"),
        ColumnDef::new("product_id", "INTEGER"),
        ColumnDef::new("description", "VARCHAR"),
        ColumnDef::new("brand_name", "VARCHAR"),
        ColumnDef::new("category", "VARCHAR"),
        ColumnDef::new("unit_price", "DECIMAL(10,2)").checked(ColumnCheck::NonNegative),
        ColumnDef::new("quantity", "INTEGER").checked(ColumnCheck::Positive),
        ColumnDef::new("purchase_date", "DATE"),
        ColumnDef::new("purchase_time", "TIME"),
        ColumnDef::new("payment_method", "VARCHAR"),
        ColumnDef::new("store_location", "VARCHAR"),
        ColumnDef::new("discount_percent", "DECIMAL(5,2)"),
        ColumnDef::new("is_discounted", "BOOLEAN"),
    ],
};

/// All relations in load order: referenced relations precede referencing ones
pub static RELATIONS: [RelationDef; 5] = [CUSTOMER, CASHIER, PRODUCT, CART, SUPERMARKET_TRANSACTIONS];

/// Names of the normalized relations, in load order
pub fn normalized_relation_names() -> Vec<&'static str> {
    RELATIONS
        .iter()
        .filter(|r| r.kind == RelationKind::Normalized)
        .map(|r| r.name)
        .collect()
}

/// Look up a relation by name (case-insensitive)
pub fn relation(name: &str) -> CoreResult<&'static RelationDef> {
    RELATIONS
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| CoreError::UnknownRelation {
            name: name.to_string(),
        })
}

/// SELECT that flattens the normalized relations into the denormalized shape.
///
/// Inner joins: a customer, cashier or product with no cart lines has no row.
pub fn flatten_select_sql() -> String {
    let columns: Vec<String> = SUPERMARKET_TRANSACTIONS
        .columns
        .iter()
        .map(|c| match c.name {
            "customer_id" | "first_name" | "last_name" | "phone_number" | "date_of_birth" => {
                format!("cu.{}", quote_ident(c.name))
            }
            "cashier_id" => format!("ca.{}", quote_ident(c.name)),
            "cashier_name" => format!("ca.{} AS {}", quote_ident("name"), quote_ident(c.name)),
            "product_id" | "description" | "brand_name" | "category" | "unit_price" => {
                format!("p.{}", quote_ident(c.name))
            }
            other => format!("c.{}", quote_ident(other)),
        })
        .collect();

    format!(
        "SELECT {}\nFROM {} AS c\nJOIN {} AS cu ON cu.{cid} = c.{cid}\nJOIN {} AS ca ON ca.{kid} = c.{kid}\nJOIN {} AS p ON p.{pid} = c.{pid}",
        columns.join(", "),
        quote_ident(CART.name),
        quote_ident(CUSTOMER.name),
        quote_ident(CASHIER.name),
        quote_ident(PRODUCT.name),
        cid = quote_ident("customer_id"),
        kid = quote_ident("cashier_id"),
        pid = quote_ident("product_id"),
    )
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
