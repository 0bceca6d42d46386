//! Public browsing of a shop's catalog.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{
    self,
    models::{product::Product, shop::Shop},
};

/// Optional filters for a storefront listing.
#[derive(Deserialize, Default, Debug)]
pub struct ProductSearchParameters {
    /// Case-insensitive prefix of the product name.
    search: Option<String>,
    /// Lowest price included, in cents.
    min_price: Option<i64>,
    /// Highest price included, in cents.
    max_price: Option<i64>,
}

/// A shop together with the products it lists.
#[derive(Serialize)]
pub struct Storefront {
    pub shop: Shop,
    pub products: Vec<Product>,
}

/// A single product page.
#[derive(Serialize)]
pub struct ProductPage {
    pub shop: Shop,
    pub product: Product,
}

/// Find an active shop by slug.
pub async fn find_shop(
    slug: &str,
    db_conn: &db::ConnectionPool,
) -> Result<Shop, errors::CatalogError> {
    Shop::select_active_by_slug(slug, db_conn)
        .await?
        .ok_or_else(|| errors::CatalogError::ShopNonExistent(slug.to_owned()))
}

/// Keep only the products matching every supplied filter.
pub fn filter_products(products: Vec<Product>, params: &ProductSearchParameters) -> Vec<Product> {
    let search_name = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase);
    products
        .into_iter()
        .filter(|product| {
            let name_match = search_name
                .as_ref()
                .is_none_or(|name| product.name.to_lowercase().starts_with(name));
            let price_min_match = params
                .min_price
                .is_none_or(|price| product.price() >= price);
            let price_max_match = params
                .max_price
                .is_none_or(|price| product.price() <= price);
            name_match && price_min_match && price_max_match
        })
        .collect()
}

/// List the products of a shop, narrowed down by the search parameters.
pub async fn storefront(
    slug: &str,
    params: &ProductSearchParameters,
    db_conn: &db::ConnectionPool,
) -> Result<Storefront, errors::CatalogError> {
    let shop = find_shop(slug, db_conn).await?;
    let products = Product::select_listed(shop.id(), db_conn).await?;
    Ok(Storefront {
        products: filter_products(products, params),
        shop,
    })
}

/// Retrieve one listed product of a shop.
pub async fn product(
    slug: &str,
    product_id: Uuid,
    db_conn: &db::ConnectionPool,
) -> Result<ProductPage, errors::CatalogError> {
    let shop = find_shop(slug, db_conn).await?;
    let product = Product::select_listed_one(shop.id(), product_id, db_conn)
        .await?
        .ok_or(errors::CatalogError::ProductNonExistent(product_id))?;
    Ok(ProductPage { shop, product })
}

pub mod errors {
    use thiserror::Error;
    use uuid::Uuid;

    use crate::db::errors::DatabaseError;

    #[derive(Error, Debug)]
    pub enum CatalogError {
        #[error(transparent)]
        DatabaseError(#[from] DatabaseError),
        #[error("Shop does not exist")]
        ShopNonExistent(String),
        #[error("Product does not exist")]
        ProductNonExistent(Uuid),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn product(name: &str, price: i64, stock: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            description: String::new(),
            price,
            stock,
        }
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|product| product.name.as_str()).collect()
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("Caffè macinato", 650, 10),
            product("Cannoli", 300, 4),
            product("Olio extravergine", 1_450, 2),
        ]
    }

    #[test]
    fn no_filters_keeps_everything() {
        let filtered = filter_products(catalog(), &ProductSearchParameters::default());
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn name_filter_is_a_case_insensitive_prefix() {
        let params = ProductSearchParameters {
            search: Some(String::from("  CA ")),
            ..ProductSearchParameters::default()
        };
        assert_eq!(
            names(&filter_products(catalog(), &params)),
            ["Caffè macinato", "Cannoli"]
        );
    }

    #[test]
    fn blank_name_filter_is_ignored() {
        let params = ProductSearchParameters {
            search: Some(String::from("   ")),
            ..ProductSearchParameters::default()
        };
        assert_eq!(filter_products(catalog(), &params).len(), 3);
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let params = ProductSearchParameters {
            min_price: Some(300),
            max_price: Some(650),
            ..ProductSearchParameters::default()
        };
        assert_eq!(
            names(&filter_products(catalog(), &params)),
            ["Caffè macinato", "Cannoli"]
        );
    }
}
