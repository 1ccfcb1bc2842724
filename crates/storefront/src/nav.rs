//! Page routes.
//!
//! Every page has a canonical server path. [`Route::parse`] also accepts
//! legacy `#/...` fragment links so bookmarks keep working; the router's
//! fallback redirects them to [`Route::href`].

use std::fmt;

/// A page of the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Order,
    Prices,
    /// Confirmation for the order with this identifier.
    OrderConfirmation(String),
    /// The caller's orders, optionally highlighting one.
    MyOrders(Option<String>),
    Admin,
    AdminOrderDetails(String),
    Profile,
    AdminUsers,
    AdminLogin,
}

/// Segment `index` of a `/`-split path, or empty.
fn segment(path: &str, index: usize) -> String {
    path.split('/').nth(index).unwrap_or_default().to_string()
}

impl Route {
    /// Match a path or `#/` fragment. Unknown paths resolve to [`Route::Home`].
    #[must_use]
    pub fn parse(fragment: &str) -> Self {
        let path = fragment.strip_prefix('#').unwrap_or(fragment);

        if path.starts_with("/confirmation/") {
            Self::OrderConfirmation(segment(path, 2))
        } else if path.starts_with("/my-orders/") {
            let id = segment(path, 2);
            Self::MyOrders((!id.is_empty()).then_some(id))
        } else if path == "/my-orders" {
            Self::MyOrders(None)
        } else if path.starts_with("/admin/orders/") {
            Self::AdminOrderDetails(segment(path, 3))
        } else {
            match path {
                "/admin" => Self::Admin,
                "/admin/users" => Self::AdminUsers,
                "/admin/login" => Self::AdminLogin,
                "/order" => Self::Order,
                "/prices" => Self::Prices,
                "/profile" => Self::Profile,
                _ => Self::Home,
            }
        }
    }

    /// Kebab-case route name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Order => "order",
            Self::Prices => "prices",
            Self::OrderConfirmation(_) => "order-confirmation",
            Self::MyOrders(_) => "my-orders",
            Self::Admin => "admin",
            Self::AdminOrderDetails(_) => "admin-order-details",
            Self::Profile => "profile",
            Self::AdminUsers => "admin-users",
            Self::AdminLogin => "admin-login",
        }
    }

    /// Order identifier carried by the route, if any.
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        match self {
            Self::OrderConfirmation(id) | Self::AdminOrderDetails(id) => Some(id),
            Self::MyOrders(id) => id.as_deref(),
            _ => None,
        }
    }

    /// Server path for links and redirects.
    #[must_use]
    pub fn href(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Order => "/order".to_string(),
            Self::Prices => "/prices".to_string(),
            Self::OrderConfirmation(id) => format!("/confirmation/{id}"),
            Self::MyOrders(None) => "/my-orders".to_string(),
            Self::MyOrders(Some(id)) => format!("/my-orders/{id}"),
            Self::Admin => "/admin".to_string(),
            Self::AdminOrderDetails(id) => format!("/admin/orders/{id}"),
            Self::Profile => "/profile".to_string(),
            Self::AdminUsers => "/admin/users".to_string(),
            Self::AdminLogin => "/admin/login".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_routes() {
        assert_eq!(Route::parse("#/order"), Route::Order);
        assert_eq!(Route::parse("#/prices"), Route::Prices);
        assert_eq!(Route::parse("#/admin"), Route::Admin);
        assert_eq!(Route::parse("/profile"), Route::Profile);
        assert_eq!(Route::parse("/admin/users"), Route::AdminUsers);
        assert_eq!(Route::parse("#/my-orders"), Route::MyOrders(None));
    }

    #[test]
    fn test_prefix_routes_take_identifier() {
        let route = Route::parse("#/admin/orders/42");
        assert_eq!(route.name(), "admin-order-details");
        assert_eq!(route.order_id(), Some("42"));

        assert_eq!(
            Route::parse("#/confirmation/7"),
            Route::OrderConfirmation("7".to_string())
        );
        assert_eq!(
            Route::parse("#/my-orders/9"),
            Route::MyOrders(Some("9".to_string()))
        );
        assert_eq!(
            Route::parse("/confirmation/7/receipt"),
            Route::OrderConfirmation("7".to_string())
        );
    }

    #[test]
    fn test_missing_identifier_is_empty() {
        assert_eq!(
            Route::parse("#/confirmation/"),
            Route::OrderConfirmation(String::new())
        );
        assert_eq!(Route::parse("#/my-orders/"), Route::MyOrders(None));
    }

    #[test]
    fn test_unmatched_is_home() {
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("#/"), Route::Home);
        assert_eq!(Route::parse("#/orders"), Route::Home);
        assert_eq!(Route::parse("#/order/"), Route::Home);
        assert_eq!(Route::parse("#/admin/orders"), Route::Home);
        assert_eq!(Route::parse("#/admin/"), Route::Home);
    }

    #[test]
    fn test_href_round_trips() {
        for route in [
            Route::Home,
            Route::Order,
            Route::Prices,
            Route::OrderConfirmation("3".to_string()),
            Route::MyOrders(None),
            Route::MyOrders(Some("3".to_string())),
            Route::Admin,
            Route::AdminOrderDetails("3".to_string()),
            Route::Profile,
            Route::AdminUsers,
            Route::AdminLogin,
        ] {
            assert_eq!(Route::parse(&route.href()), route);
        }
    }
}
