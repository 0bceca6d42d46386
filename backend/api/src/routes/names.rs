//! The named route table. Every path the router serves is declared here once
//! and URLs are generated from the same templates.
use axum::{http::Method, routing::MethodFilter};

/// A named route of the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteName {
    Home,
    Health,
    ShopIndex,
    ShopProduct,
    ShopCartAdd,
    ShopCart,
    ShopCartCount,
    ShopCartUpdate,
    ShopCheckout,
    ShopCheckoutProcess,
    ShopConfirmation,
    OpenAiGenerate,
    OpenAiChat,
    OpenAiModels,
    OpenAiTest,
    AuthLogin,
    AuthLogout,
    AuthWhoami,
}

impl RouteName {
    pub const ALL: [Self; 18] = [
        Self::Home,
        Self::Health,
        Self::ShopIndex,
        Self::ShopProduct,
        Self::ShopCartAdd,
        Self::ShopCart,
        Self::ShopCartCount,
        Self::ShopCartUpdate,
        Self::ShopCheckout,
        Self::ShopCheckoutProcess,
        Self::ShopConfirmation,
        Self::OpenAiGenerate,
        Self::OpenAiChat,
        Self::OpenAiModels,
        Self::OpenAiTest,
        Self::AuthLogin,
        Self::AuthLogout,
        Self::AuthWhoami,
    ];

    /// The dotted name of the route.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Health => "health",
            Self::ShopIndex => "shop.index",
            Self::ShopProduct => "shop.prodotto",
            Self::ShopCartAdd => "shop.carrello.aggiungi",
            Self::ShopCart => "shop.carrello",
            Self::ShopCartCount => "shop.carrello.conteggio",
            Self::ShopCartUpdate => "shop.carrello.aggiorna",
            Self::ShopCheckout => "shop.checkout",
            Self::ShopCheckoutProcess => "shop.checkout.processa",
            Self::ShopConfirmation => "shop.conferma",
            Self::OpenAiGenerate => "openai.generate",
            Self::OpenAiChat => "openai.chat",
            Self::OpenAiModels => "openai.models",
            Self::OpenAiTest => "openai.test",
            Self::AuthLogin => "auth.login",
            Self::AuthLogout => "auth.logout",
            Self::AuthWhoami => "auth.whoami",
        }
    }

    /// The path template, with `{param}` placeholders.
    pub const fn template(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Health => "/health",
            Self::ShopIndex => "/shop/{slug}",
            Self::ShopProduct => "/shop/{slug}/prodotto/{prodotto}",
            Self::ShopCartAdd => "/shop/{slug}/carrello/aggiungi",
            Self::ShopCart => "/shop/{slug}/carrello",
            Self::ShopCartCount => "/shop/{slug}/carrello/conteggio",
            Self::ShopCartUpdate => "/shop/{slug}/carrello/aggiorna",
            Self::ShopCheckout | Self::ShopCheckoutProcess => "/shop/{slug}/checkout",
            Self::ShopConfirmation => "/shop/{slug}/conferma/{ordine}",
            Self::OpenAiGenerate => "/api/openai/generate",
            Self::OpenAiChat => "/api/openai/chat",
            Self::OpenAiModels => "/api/openai/models",
            Self::OpenAiTest => "/api/openai/test",
            Self::AuthLogin => "/auth/login",
            Self::AuthLogout => "/auth/logout",
            Self::AuthWhoami => "/auth/whoami",
        }
    }

    /// Every route is either a GET or a POST.
    const fn is_post(self) -> bool {
        match self {
            Self::ShopCartAdd
            | Self::ShopCartUpdate
            | Self::ShopCheckoutProcess
            | Self::OpenAiGenerate
            | Self::OpenAiChat
            | Self::AuthLogin
            | Self::AuthLogout => true,
            Self::Home
            | Self::Health
            | Self::ShopIndex
            | Self::ShopProduct
            | Self::ShopCart
            | Self::ShopCartCount
            | Self::ShopCheckout
            | Self::ShopConfirmation
            | Self::OpenAiModels
            | Self::OpenAiTest
            | Self::AuthWhoami => false,
        }
    }

    pub fn method(self) -> Method {
        if self.is_post() {
            Method::POST
        } else {
            Method::GET
        }
    }

    /// The filter the router registers the route's handler under.
    pub const fn method_filter(self) -> MethodFilter {
        if self.is_post() {
            MethodFilter::POST
        } else {
            MethodFilter::GET
        }
    }

    /// Whether the route sits behind the session middleware.
    pub const fn requires_auth(self) -> bool {
        matches!(
            self,
            Self::OpenAiGenerate
                | Self::OpenAiChat
                | Self::OpenAiModels
                | Self::OpenAiTest
                | Self::AuthLogout
                | Self::AuthWhoami
        )
    }

    /// Resolve a dotted route name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|route| route.name() == name)
    }
}

/// Whether a parameter value can be placed in a path without escaping.
fn is_url_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~'))
}

/// Build the path of a route, filling every `{param}` placeholder from
/// `params`. Extra parameters are ignored.
pub fn url_for(route: RouteName, params: &[(&str, &str)]) -> Result<String, errors::UrlError> {
    let mut url = String::with_capacity(route.template().len());
    let mut rest = route.template();
    while let Some(start) = rest.find('{') {
        url.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').unwrap_or(after.len());
        let parameter = &after[..end];
        let value = params
            .iter()
            .find(|&&(key, _)| key == parameter)
            .map(|&(_, value)| value)
            .ok_or_else(|| errors::UrlError::MissingParameter {
                route: route.name(),
                parameter: parameter.to_owned(),
            })?;
        if !is_url_safe(value) {
            return Err(errors::UrlError::InvalidParameter {
                parameter: parameter.to_owned(),
                value: value.to_owned(),
            });
        }
        url.push_str(value);
        rest = after.get(end + 1..).unwrap_or("");
    }
    url.push_str(rest);
    Ok(url)
}

pub mod errors {
    use thiserror::Error;

    #[derive(Error, Debug, PartialEq, Eq)]
    pub enum UrlError {
        #[error("Route {route} needs the parameter {parameter}")]
        MissingParameter {
            route: &'static str,
            parameter: String,
        },
        #[error("{value:?} cannot be used as the parameter {parameter}")]
        InvalidParameter { parameter: String, value: String },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn names_resolve_to_documented_templates() {
        let expected = [
            ("shop.index", "/shop/{slug}"),
            ("shop.prodotto", "/shop/{slug}/prodotto/{prodotto}"),
            ("shop.carrello.aggiungi", "/shop/{slug}/carrello/aggiungi"),
            ("shop.carrello", "/shop/{slug}/carrello"),
            ("shop.carrello.conteggio", "/shop/{slug}/carrello/conteggio"),
            ("shop.carrello.aggiorna", "/shop/{slug}/carrello/aggiorna"),
            ("shop.checkout", "/shop/{slug}/checkout"),
            ("shop.checkout.processa", "/shop/{slug}/checkout"),
            ("shop.conferma", "/shop/{slug}/conferma/{ordine}"),
            ("openai.generate", "/api/openai/generate"),
            ("openai.chat", "/api/openai/chat"),
            ("openai.models", "/api/openai/models"),
            ("openai.test", "/api/openai/test"),
        ];
        for (name, template) in expected {
            let route = RouteName::from_name(name).unwrap();
            assert_eq!(route.template(), template, "{name}");
            assert_eq!(route.name(), name);
        }
        assert_eq!(RouteName::from_name("shop.ordini"), None);
    }

    #[test]
    fn methods_match_the_table() {
        assert_eq!(RouteName::ShopCartAdd.method(), Method::POST);
        assert_eq!(RouteName::ShopCheckout.method(), Method::GET);
        assert_eq!(RouteName::ShopCheckoutProcess.method(), Method::POST);
        assert_eq!(RouteName::OpenAiModels.method(), Method::GET);
    }

    #[test]
    fn method_filters_agree_with_methods() {
        for route in RouteName::ALL {
            assert_eq!(
                MethodFilter::try_from(route.method()).ok(),
                Some(route.method_filter()),
                "{}",
                route.name()
            );
        }
    }

    #[test]
    fn names_and_method_template_pairs_are_unique() {
        let names: HashSet<_> = RouteName::ALL.iter().map(|route| route.name()).collect();
        assert_eq!(names.len(), RouteName::ALL.len());
        let endpoints: HashSet<_> = RouteName::ALL
            .iter()
            .map(|route| (route.method(), route.template()))
            .collect();
        assert_eq!(endpoints.len(), RouteName::ALL.len());
    }

    #[test]
    fn only_api_and_session_routes_need_auth() {
        for route in RouteName::ALL {
            if route.template().starts_with("/shop/") {
                assert!(!route.requires_auth(), "{}", route.name());
            }
            if route.template().starts_with("/api/openai/") {
                assert!(route.requires_auth(), "{}", route.name());
            }
        }
    }

    #[test]
    fn url_for_fills_placeholders() {
        assert_eq!(
            url_for(
                RouteName::ShopConfirmation,
                &[("slug", "bottega"), ("ordine", "0b7e-42")]
            ),
            Ok("/shop/bottega/conferma/0b7e-42".to_owned())
        );
        assert_eq!(
            url_for(RouteName::ShopCartAdd, &[("slug", "bottega"), ("unused", "x")]),
            Ok("/shop/bottega/carrello/aggiungi".to_owned())
        );
        assert_eq!(url_for(RouteName::Health, &[]), Ok("/health".to_owned()));
    }

    #[test]
    fn url_for_rejects_missing_and_unsafe_values() {
        assert_eq!(
            url_for(RouteName::ShopProduct, &[("slug", "bottega")]),
            Err(errors::UrlError::MissingParameter {
                route: "shop.prodotto",
                parameter: "prodotto".to_owned(),
            })
        );
        assert!(matches!(
            url_for(RouteName::ShopIndex, &[("slug", "a/b")]),
            Err(errors::UrlError::InvalidParameter { .. })
        ));
        assert!(matches!(
            url_for(RouteName::ShopIndex, &[("slug", "")]),
            Err(errors::UrlError::InvalidParameter { .. })
        ));
    }
}
