//! Turning a guest cart into an order.
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    cache,
    db::{
        self,
        models::{
            order::{Order, OrderInsert},
            order_item::OrderItemInsert,
            product::Product,
            shop::Shop,
        },
    },
    services::cart::{self, CartView},
    utils::email::EmailAddress,
};

const NAME_MAX_LENGTH: usize = 255;
const EMAIL_MAX_LENGTH: usize = 255;
const PHONE_MAX_LENGTH: usize = 50;
const ADDRESS_MAX_LENGTH: usize = 1000;
const NOTES_MAX_LENGTH: usize = 2000;

/// Customer fields which must be filled in.
pub const REQUIRED_FIELDS: [&str; 3] = ["customer_name", "customer_email", "shipping_address"];
/// Customer fields which may be left out.
pub const OPTIONAL_FIELDS: [&str; 2] = ["customer_phone", "notes"];

/// The customer details submitted with the checkout form.
#[derive(Deserialize, Debug, Default)]
pub struct CustomerDetails {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub shipping_address: String,
    pub notes: Option<String>,
}

/// Customer details which passed validation, trimmed. Blank optional
/// fields are stored as absent.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidatedCustomer {
    name: String,
    email: String,
    phone: Option<String>,
    address: String,
    notes: Option<String>,
}

/// A field which failed validation, and why.
#[derive(Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: &'static str,
}

fn check_length(
    field: &'static str,
    value: &str,
    max: usize,
    field_errors: &mut Vec<FieldError>,
) {
    if value.chars().count() > max {
        field_errors.push(FieldError {
            field,
            reason: "is too long",
        });
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

impl CustomerDetails {
    /// Validate every field, collecting all problems at once.
    pub fn validate(self) -> Result<ValidatedCustomer, Vec<FieldError>> {
        let mut field_errors = Vec::new();
        let name = self.customer_name.trim().to_owned();
        let email = self.customer_email.trim().to_owned();
        let address = self.shipping_address.trim().to_owned();
        let phone = optional(self.customer_phone);
        let notes = optional(self.notes);

        if name.is_empty() {
            field_errors.push(FieldError {
                field: "customer_name",
                reason: "is required",
            });
        }
        check_length("customer_name", &name, NAME_MAX_LENGTH, &mut field_errors);
        if EmailAddress::try_from(email.as_str()).is_err() {
            field_errors.push(FieldError {
                field: "customer_email",
                reason: "must be a valid email address",
            });
        }
        check_length("customer_email", &email, EMAIL_MAX_LENGTH, &mut field_errors);
        if address.is_empty() {
            field_errors.push(FieldError {
                field: "shipping_address",
                reason: "is required",
            });
        }
        check_length(
            "shipping_address",
            &address,
            ADDRESS_MAX_LENGTH,
            &mut field_errors,
        );
        if let Some(ref phone) = phone {
            check_length("customer_phone", phone, PHONE_MAX_LENGTH, &mut field_errors);
        }
        if let Some(ref notes) = notes {
            check_length("notes", notes, NOTES_MAX_LENGTH, &mut field_errors);
        }

        if field_errors.is_empty() {
            Ok(ValidatedCustomer {
                name,
                email,
                phone,
                address,
                notes,
            })
        } else {
            Err(field_errors)
        }
    }
}

/// What the checkout page needs to render.
#[derive(Serialize)]
pub struct CheckoutForm {
    pub shop: Shop,
    pub cart: CartView,
    pub required_fields: [&'static str; 3],
    pub optional_fields: [&'static str; 2],
}

/// Prepare the checkout page. An empty cart cannot be checked out.
pub async fn form(
    shop: Shop,
    token: Option<&str>,
    db_conn: &db::ConnectionPool,
    cache_pool: &cache::Pool,
) -> Result<CheckoutForm, errors::CheckoutError> {
    let cart = cart::view(&shop, token, db_conn, cache_pool).await?;
    if cart.is_empty() {
        return Err(errors::CheckoutError::EmptyCart);
    }
    Ok(CheckoutForm {
        shop,
        cart,
        required_fields: REQUIRED_FIELDS,
        optional_fields: OPTIONAL_FIELDS,
    })
}

/// Place an order for the contents of a cart.
///
/// Stock is checked and taken inside one transaction with the product rows
/// locked, so two customers can never both buy the last unit. The cart is
/// emptied once the order is committed.
pub async fn place_order(
    shop: &Shop,
    token: Option<&str>,
    details: CustomerDetails,
    db_conn: &db::ConnectionPool,
    cache_pool: &cache::Pool,
) -> Result<Order, errors::CheckoutError> {
    let customer = details
        .validate()
        .map_err(errors::CheckoutError::Validation)?;
    let mut lines: Vec<(Uuid, u32)> = cart::quantities(shop, token, cache_pool)
        .await?
        .into_iter()
        .filter(|&(_, quantity)| quantity > 0)
        .collect();
    if lines.is_empty() {
        return Err(errors::CheckoutError::EmptyCart);
    }
    // Lock rows in ID order so concurrent checkouts cannot deadlock.
    lines.sort_unstable_by_key(|&(product, _)| product);

    let mut tx = db_conn.begin().await.map_err(db::errors::DatabaseError::from)?;
    let mut locked: Vec<(Product, u32)> = Vec::with_capacity(lines.len());
    let mut total: i64 = 0;
    for (product_id, quantity) in lines {
        let product = Product::select_listed_for_update(shop.id(), product_id, &mut *tx)
            .await?
            .ok_or(errors::CheckoutError::ProductUnavailable(product_id))?;
        if !product.has_stock_for(u64::from(quantity)) {
            return Err(errors::CheckoutError::InsufficientStock {
                product: product_id,
                available: product.stock(),
            });
        }
        total = product
            .price()
            .checked_mul(i64::from(quantity))
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or(errors::CheckoutError::TotalTooLarge)?;
        locked.push((product, quantity));
    }

    let order = OrderInsert {
        shop_id: shop.id(),
        customer_name: customer.name,
        customer_email: customer.email,
        customer_phone: customer.phone,
        shipping_address: customer.address,
        notes: customer.notes,
        total,
    }
    .store(&mut *tx)
    .await?;
    for (mut product, quantity) in locked {
        OrderItemInsert::new(
            order.id(),
            product.id(),
            &product.name,
            product.price(),
            quantity,
        )
        .store(&mut *tx)
        .await?;
        product.remove_stock(quantity, &mut *tx).await?;
    }
    tx.commit().await.map_err(db::errors::DatabaseError::from)?;
    info!(shop = %shop.slug, order = %order.id(), total = order.total(), "Order placed");

    if let Some(token) = token {
        if let Err(err) = cart::clear(shop, token, cache_pool).await {
            warn!(
                order = %order.id(),
                error = %err,
                "Order placed but the cart could not be cleared"
            );
        }
    }
    Ok(order)
}

pub mod errors {
    use thiserror::Error;
    use uuid::Uuid;

    use super::FieldError;
    use crate::{db::errors::DatabaseError, services::cart::errors::CartError};

    #[derive(Error, Debug)]
    pub enum CheckoutError {
        #[error(transparent)]
        DatabaseError(#[from] DatabaseError),
        #[error(transparent)]
        CartError(#[from] CartError),
        #[error("The cart is empty")]
        EmptyCart,
        #[error("The submitted details are invalid")]
        Validation(Vec<FieldError>),
        #[error("Product is no longer available")]
        ProductUnavailable(Uuid),
        #[error("Only {available} left in stock")]
        InsufficientStock { product: Uuid, available: i64 },
        #[error("Order total exceeds the maximum allowable value")]
        TotalTooLarge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_details() -> CustomerDetails {
        CustomerDetails {
            customer_name: String::from("  Mario Rossi "),
            customer_email: String::from("mario@example.it"),
            customer_phone: Some(String::from("   ")),
            shipping_address: String::from("Via Roma 1, Milano"),
            notes: Some(String::from(" Citofono 3 ")),
        }
    }

    #[test]
    fn valid_details_are_trimmed() {
        let customer = valid_details().validate().unwrap();
        assert_eq!(
            customer,
            ValidatedCustomer {
                name: String::from("Mario Rossi"),
                email: String::from("mario@example.it"),
                phone: None,
                address: String::from("Via Roma 1, Milano"),
                notes: Some(String::from("Citofono 3")),
            }
        );
    }

    #[test]
    fn every_problem_is_reported() {
        let field_errors = CustomerDetails {
            customer_name: String::from("   "),
            customer_email: String::from("not-an-email"),
            ..CustomerDetails::default()
        }
        .validate()
        .unwrap_err();
        let fields: Vec<&str> = field_errors.iter().map(|error| error.field).collect();
        assert_eq!(fields, ["customer_name", "customer_email", "shipping_address"]);
    }

    #[test]
    fn overlong_fields_are_rejected() {
        let field_errors = CustomerDetails {
            notes: Some("x".repeat(NOTES_MAX_LENGTH + 1)),
            ..valid_details()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            field_errors,
            [FieldError {
                field: "notes",
                reason: "is too long"
            }]
        );
    }
}
