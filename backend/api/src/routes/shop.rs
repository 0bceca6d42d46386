//! Routes under /shop/{slug}: the public storefront, guest cart and checkout.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar, WithRejection,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    constants::cart::CART_COOKIE,
    routes::{
        names::{errors::UrlError, url_for, RouteName},
        RouteTable,
    },
    services::{
        cart::{self, errors::CartError, CartView},
        catalog::{self, errors::CatalogError, ProductPage, ProductSearchParameters, Storefront},
        checkout::{self, errors::CheckoutError, CheckoutForm, CustomerDetails},
        errors::StorageError,
        orders::{self, errors::OrderRetrievalError, OrderWithItems},
    },
    state::AppState,
    utils::{
        httperror::{HttpError, JsonBody, PathParams, QueryParams},
        tokens::{generate_token, is_well_formed},
    },
};

/// Register every /shop/{slug} route. None of them need a session.
pub fn register(routes: RouteTable) -> RouteTable {
    routes
        .add(RouteName::ShopIndex, index)
        .add(RouteName::ShopProduct, product)
        .add(RouteName::ShopCartAdd, add_to_cart)
        .add(RouteName::ShopCart, view_cart)
        .add(RouteName::ShopCartCount, cart_count)
        .add(RouteName::ShopCartUpdate, update_cart)
        .add(RouteName::ShopCheckout, checkout_form)
        .add(RouteName::ShopCheckoutProcess, place_order)
        .add(RouteName::ShopConfirmation, confirmation)
}

/// The cart token from the request, if it carries a plausible one.
fn cart_token(cookies: &CookieJar) -> Option<&str> {
    cookies
        .get(CART_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|token| is_well_formed(token))
}

fn cart_cookie(token: String) -> Cookie<'static> {
    Cookie::build((CART_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

async fn index(
    State(state): State<AppState>,
    WithRejection(Path(slug), _): PathParams<String>,
    WithRejection(Query(params), _): QueryParams<ProductSearchParameters>,
) -> Result<Json<Storefront>, HttpError> {
    Ok(Json(catalog::storefront(&slug, &params, &state.db).await?))
}

async fn product(
    State(state): State<AppState>,
    WithRejection(Path((slug, product_id)), _): PathParams<(String, Uuid)>,
) -> Result<Json<ProductPage>, HttpError> {
    Ok(Json(catalog::product(&slug, product_id, &state.db).await?))
}

const fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
struct AddToCartRequest {
    product: Uuid,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

#[derive(Serialize)]
struct CartCountResponse {
    count: u64,
}

/// The visitor's cart token, or a new one with the cookie that carries it.
fn ensure_cart_token(cookies: CookieJar) -> Result<(CookieJar, String), HttpError> {
    if let Some(token) = cart_token(&cookies).map(str::to_owned) {
        return Ok((cookies, token));
    }
    let token = generate_token()?;
    Ok((cookies.add(cart_cookie(token.clone())), token))
}

/// Add a product to the cart, starting a new cart when the visitor has none.
async fn add_to_cart(
    State(state): State<AppState>,
    WithRejection(Path(slug), _): PathParams<String>,
    cookies: CookieJar,
    WithRejection(Json(body), _): JsonBody<AddToCartRequest>,
) -> Result<(CookieJar, Json<CartCountResponse>), HttpError> {
    let shop = catalog::find_shop(&slug, &state.db).await?;
    let (cookies, token) = ensure_cart_token(cookies)?;
    let count = cart::add_item(
        &shop,
        &token,
        body.product,
        body.quantity,
        &state.db,
        &state.cache,
    )
    .await?;
    Ok((cookies, Json(CartCountResponse { count })))
}

async fn view_cart(
    State(state): State<AppState>,
    WithRejection(Path(slug), _): PathParams<String>,
    cookies: CookieJar,
) -> Result<Json<CartView>, HttpError> {
    let shop = catalog::find_shop(&slug, &state.db).await?;
    Ok(Json(
        cart::view(&shop, cart_token(&cookies), &state.db, &state.cache).await?,
    ))
}

async fn cart_count(
    State(state): State<AppState>,
    WithRejection(Path(slug), _): PathParams<String>,
    cookies: CookieJar,
) -> Result<Json<CartCountResponse>, HttpError> {
    let shop = catalog::find_shop(&slug, &state.db).await?;
    let count = cart::count(&shop, cart_token(&cookies), &state.cache).await?;
    Ok(Json(CartCountResponse { count }))
}

#[derive(Deserialize)]
struct CartUpdateEntry {
    product: Uuid,
    quantity: u32,
}

#[derive(Deserialize)]
struct CartUpdateRequest {
    items: Vec<CartUpdateEntry>,
}

/// Set the quantity of several lines at once. A quantity of 0 removes the line.
async fn update_cart(
    State(state): State<AppState>,
    WithRejection(Path(slug), _): PathParams<String>,
    cookies: CookieJar,
    WithRejection(Json(body), _): JsonBody<CartUpdateRequest>,
) -> Result<(CookieJar, Json<CartView>), HttpError> {
    let shop = catalog::find_shop(&slug, &state.db).await?;
    let (cookies, token) = ensure_cart_token(cookies)?;
    let updates: Vec<(Uuid, u32)> = body
        .items
        .iter()
        .map(|entry| (entry.product, entry.quantity))
        .collect();
    let view = cart::update(&shop, &token, &updates, &state.db, &state.cache).await?;
    Ok((cookies, Json(view)))
}

async fn checkout_form(
    State(state): State<AppState>,
    WithRejection(Path(slug), _): PathParams<String>,
    cookies: CookieJar,
) -> Result<Json<CheckoutForm>, HttpError> {
    let shop = catalog::find_shop(&slug, &state.db).await?;
    Ok(Json(
        checkout::form(shop, cart_token(&cookies), &state.db, &state.cache).await?,
    ))
}

#[derive(Serialize)]
struct PlaceOrderResponse {
    order: Uuid,
    total: i64,
    confirmation_url: String,
}

async fn place_order(
    State(state): State<AppState>,
    WithRejection(Path(slug), _): PathParams<String>,
    cookies: CookieJar,
    WithRejection(Json(details), _): JsonBody<CustomerDetails>,
) -> Result<(StatusCode, Json<PlaceOrderResponse>), HttpError> {
    let shop = catalog::find_shop(&slug, &state.db).await?;
    let order = checkout::place_order(
        &shop,
        cart_token(&cookies),
        details,
        &state.db,
        &state.cache,
    )
    .await?;
    let order_id = order.id().to_string();
    let confirmation_url = url_for(
        RouteName::ShopConfirmation,
        &[("slug", shop.slug.as_str()), ("ordine", order_id.as_str())],
    )?;
    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            order: order.id(),
            total: order.total(),
            confirmation_url,
        }),
    ))
}

async fn confirmation(
    State(state): State<AppState>,
    WithRejection(Path((slug, order_id)), _): PathParams<(String, Uuid)>,
) -> Result<Json<OrderWithItems>, HttpError> {
    let shop = catalog::find_shop(&slug, &state.db).await?;
    Ok(Json(
        orders::get_order_with_items(&shop, order_id, &state.db).await?,
    ))
}

impl From<StorageError> for HttpError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::DatabaseError(err) => err.into(),
            StorageError::CacheError(err) => err.into(),
        }
    }
}

impl From<CatalogError> for HttpError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::DatabaseError(err) => err.into(),
            CatalogError::ShopNonExistent(slug) => {
                info!(%slug, "Requested a shop which does not exist");
                Self::new(StatusCode::NOT_FOUND, Some(String::from("Shop not found")))
            }
            CatalogError::ProductNonExistent(product_id) => {
                info!(%product_id, "Requested a product which does not exist");
                Self::new(
                    StatusCode::NOT_FOUND,
                    Some(format!("Product {product_id} not found")),
                )
            }
        }
    }
}

impl From<CartError> for HttpError {
    fn from(error: CartError) -> Self {
        match error {
            CartError::StorageError(err) => err.into(),
            CartError::InvalidQuantity => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                Some(error.to_string()),
            ),
            CartError::ProductNonExistent(product_id) => {
                warn!(%product_id, "Attempted to add a product which is not listed");
                Self::new(
                    StatusCode::NOT_FOUND,
                    Some(format!("Product {product_id} not found")),
                )
            }
            CartError::InsufficientStock {
                product,
                available,
                requested,
            } => {
                warn!(%product, available, requested, "Cart quantity exceeds stock");
                Self::new(StatusCode::CONFLICT, Some(error.to_string()))
            }
            CartError::TotalTooLarge => {
                warn!("Cart total exceeded i64 max");
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, Some(error.to_string()))
            }
        }
    }
}

impl From<CheckoutError> for HttpError {
    fn from(error: CheckoutError) -> Self {
        match error {
            CheckoutError::DatabaseError(err) => err.into(),
            CheckoutError::CartError(err) => err.into(),
            CheckoutError::EmptyCart => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, Some(error.to_string()))
            }
            CheckoutError::Validation(field_errors) => {
                let message = field_errors
                    .iter()
                    .map(|field_error| format!("{} {}", field_error.field, field_error.reason))
                    .collect::<Vec<_>>()
                    .join("; ");
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, Some(message))
            }
            CheckoutError::ProductUnavailable(product_id) => {
                warn!(%product_id, "Checkout of a product which is no longer listed");
                Self::new(
                    StatusCode::CONFLICT,
                    Some(format!("Product {product_id} is no longer available")),
                )
            }
            CheckoutError::InsufficientStock { product, available } => {
                warn!(%product, available, "Checkout quantity exceeds stock");
                Self::new(StatusCode::CONFLICT, Some(error.to_string()))
            }
            CheckoutError::TotalTooLarge => {
                warn!("Order total exceeded i64 max");
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, Some(error.to_string()))
            }
        }
    }
}

impl From<OrderRetrievalError> for HttpError {
    fn from(error: OrderRetrievalError) -> Self {
        match error {
            OrderRetrievalError::DatabaseError(err) => err.into(),
            OrderRetrievalError::OrderNonExistent(order_id) => {
                info!(%order_id, "Requested an order which does not exist");
                Self::new(
                    StatusCode::NOT_FOUND,
                    Some(format!("Order {order_id} not found")),
                )
            }
        }
    }
}

impl From<UrlError> for HttpError {
    fn from(error: UrlError) -> Self {
        error!(error = %error, "Failed to build a route URL");
        Self::from(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_cookie_is_http_only_and_lax() {
        let cookie = cart_cookie(String::from("abc"));
        assert_eq!(cookie.name(), CART_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn malformed_cart_tokens_are_ignored() {
        let jar = CookieJar::new().add(Cookie::new(CART_COOKIE, "../../etc"));
        assert_eq!(cart_token(&jar), None);
        let token = generate_token().unwrap();
        let jar = CookieJar::new().add(Cookie::new(CART_COOKIE, token.clone()));
        assert_eq!(cart_token(&jar), Some(token.as_str()));
    }

    #[test]
    fn cart_rule_violations_map_to_their_statuses() {
        assert_eq!(
            HttpError::from(CartError::InvalidQuantity).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            HttpError::from(CartError::ProductNonExistent(Uuid::new_v4())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn stock_conflicts_map_to_409() {
        let error = CartError::InsufficientStock {
            product: Uuid::new_v4(),
            available: 1,
            requested: 2,
        };
        assert_eq!(HttpError::from(error).status(), StatusCode::CONFLICT);
        assert_eq!(
            HttpError::from(CheckoutError::EmptyCart).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            HttpError::from(CatalogError::ShopNonExistent(String::from("nope"))).status(),
            StatusCode::NOT_FOUND
        );
    }
}
