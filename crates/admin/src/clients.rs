//! Client list: customers with their orders, searchable and sortable.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use tienda_core::{Role, UserDetail};
use tienda_storefront::repository::UserRepository;
use tracing::{info, instrument};

use crate::error::AdminError;

/// Sort orders offered by the client list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientSort {
    /// Most recent order first.
    #[default]
    RecentActivity,
    Alphabetical,
    MostOrders,
    NewestClient,
}

impl ClientSort {
    pub const ALL: [Self; 4] = [
        Self::RecentActivity,
        Self::Alphabetical,
        Self::MostOrders,
        Self::NewestClient,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::RecentActivity => "Actividad Reciente",
            Self::Alphabetical => "A-Z",
            Self::MostOrders => "Más Pedidos",
            Self::NewestClient => "Más Nuevo",
        }
    }
}

impl FromStr for ClientSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recent" | "actividad reciente" => Ok(Self::RecentActivity),
            "alpha" | "alphabetical" | "a-z" => Ok(Self::Alphabetical),
            "orders" | "most-orders" | "más pedidos" => Ok(Self::MostOrders),
            "newest" | "más nuevo" => Ok(Self::NewestClient),
            other => Err(format!("invalid client sort: {other}")),
        }
    }
}

/// Aggregates for a single client's order history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientStats {
    pub total_orders: usize,
    /// Sum of positive order totals.
    pub total_spent: Decimal,
    pub last_order_date: Option<String>,
    /// Order count keyed by status name.
    pub status_breakdown: BTreeMap<String, usize>,
}

impl ClientStats {
    #[must_use]
    pub fn for_client(client: &UserDetail) -> Self {
        let mut stats = Self {
            total_orders: client.orders.len(),
            ..Self::default()
        };
        for order in &client.orders {
            if order.total > Decimal::ZERO {
                stats.total_spent += order.total;
            }
            *stats
                .status_breakdown
                .entry(order.status.name.clone())
                .or_default() += 1;
        }
        stats.last_order_date = last_order_date(client).map(str::to_string);
        stats
    }
}

fn last_order_date(client: &UserDetail) -> Option<&str> {
    client.orders.iter().map(|o| o.date_order.as_str()).max()
}

fn matches(client: &UserDetail, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    let settings = client.settings.as_ref();
    client.username.to_lowercase().contains(&query)
        || client.email.to_lowercase().contains(&query)
        || settings.is_some_and(|s| s.name.to_lowercase().contains(&query))
        || settings.is_some_and(|s| s.phone.to_string().contains(&query))
}

/// Filter by `query` then order by `sort`.
#[must_use]
pub fn filter_and_sort(clients: &[UserDetail], query: &str, sort: ClientSort) -> Vec<UserDetail> {
    let mut view: Vec<UserDetail> = clients
        .iter()
        .filter(|c| matches(c, query))
        .cloned()
        .collect();
    match sort {
        ClientSort::RecentActivity => view.sort_by(|a, b| {
            let a = last_order_date(a).unwrap_or("0000-00-00");
            let b = last_order_date(b).unwrap_or("0000-00-00");
            b.cmp(a)
        }),
        ClientSort::Alphabetical => view.sort_by_cached_key(|c| c.username.to_lowercase()),
        ClientSort::MostOrders => view.sort_by_key(|c| Reverse(c.orders.len())),
        ClientSort::NewestClient => view.sort_by_key(|c| Reverse(c.id)),
    }
    view
}

/// Customer list loaded from the backend.
#[derive(Debug, Clone)]
pub struct ClientList {
    users: UserRepository,
    clients: Vec<UserDetail>,
}

impl ClientList {
    #[must_use]
    pub const fn new(users: UserRepository) -> Self {
        Self {
            users,
            clients: Vec::new(),
        }
    }

    /// Load every customer with their orders.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the previous list is kept.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<usize, AdminError> {
        self.clients = self.users.details_by_role(Role::Customer.id()).await?;
        info!(count = self.clients.len(), "Clients loaded");
        Ok(self.clients.len())
    }

    #[must_use]
    pub fn clients(&self) -> &[UserDetail] {
        &self.clients
    }

    #[must_use]
    pub fn view(&self, query: &str, sort: ClientSort) -> Vec<UserDetail> {
        filter_and_sort(&self.clients, query, sort)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;
    use tienda_core::{ClientOrder, ClientSettings, NamedRef, OrderId, RoleId, SettingId, StatusId, UserId};
    use tienda_storefront::api::{ApiClient, RetryPolicy};
    use tienda_storefront::config::ApiConfig;

    use super::*;

    fn order(id: i64, date: &str, status: &str, total: i64) -> ClientOrder {
        ClientOrder {
            order_id: OrderId::new(id),
            date_order: date.to_string(),
            status: NamedRef {
                id: 1,
                name: status.to_string(),
            },
            status_id: StatusId::new(1),
            total_products: 1,
            total: Decimal::new(total, 0),
            payment_id: None,
            products: Vec::new(),
        }
    }

    fn client(id: i64, username: &str, phone: i64, orders: Vec<ClientOrder>) -> UserDetail {
        UserDetail {
            id: UserId::new(id),
            username: username.to_string(),
            email: format!("{}@tienda.co", username.to_lowercase()),
            role: NamedRef {
                id: 1,
                name: "cliente".to_string(),
            },
            role_id: RoleId::new(1),
            settings: Some(ClientSettings {
                id: SettingId::new(id),
                name: format!("{username} Pérez"),
                nickname: username.to_string(),
                phone,
                city: "Medellín".to_string(),
                address: "Calle 10".to_string(),
                payments: Vec::new(),
            }),
            setting_id: Some(SettingId::new(id)),
            orders,
        }
    }

    fn sample() -> Vec<UserDetail> {
        vec![
            client(1, "carla", 3_001_112_233, vec![order(1, "2024-01-10", "Pendiente", 100)]),
            client(
                2,
                "Andrés",
                3_104_445_566,
                vec![
                    order(2, "2024-03-01", "Enviado", 200),
                    order(3, "2024-02-01", "Pendiente", 50),
                ],
            ),
            client(3, "beto", 3_207_778_899, Vec::new()),
        ]
    }

    fn ids(view: &[UserDetail]) -> Vec<i64> {
        view.iter().map(|c| c.id.as_i64()).collect()
    }

    #[test]
    fn test_sorts() {
        let clients = sample();
        assert_eq!(ids(&filter_and_sort(&clients, "", ClientSort::RecentActivity)), vec![2, 1, 3]);
        assert_eq!(ids(&filter_and_sort(&clients, "", ClientSort::Alphabetical)), vec![2, 3, 1]);
        assert_eq!(ids(&filter_and_sort(&clients, "", ClientSort::MostOrders)), vec![2, 1, 3]);
        assert_eq!(ids(&filter_and_sort(&clients, "", ClientSort::NewestClient)), vec![3, 2, 1]);
    }

    #[test]
    fn test_search_fields() {
        let clients = sample();
        assert_eq!(ids(&filter_and_sort(&clients, "CARLA", ClientSort::NewestClient)), vec![1]);
        assert_eq!(ids(&filter_and_sort(&clients, "beto@", ClientSort::NewestClient)), vec![3]);
        assert_eq!(ids(&filter_and_sort(&clients, "andrés pérez", ClientSort::NewestClient)), vec![2]);
        assert_eq!(ids(&filter_and_sort(&clients, "3207", ClientSort::NewestClient)), vec![3]);
        assert_eq!(filter_and_sort(&clients, "   ", ClientSort::NewestClient).len(), 3);
        assert!(filter_and_sort(&clients, "zzz", ClientSort::NewestClient).is_empty());
    }

    #[test]
    fn test_client_stats() {
        let mut andres = sample().swap_remove(1);
        andres.orders.push(order(4, "2023-12-24", "Enviado", -30));
        let stats = ClientStats::for_client(&andres);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.total_spent, Decimal::new(250, 0));
        assert_eq!(stats.last_order_date.as_deref(), Some("2024-03-01"));
        assert_eq!(stats.status_breakdown.get("Enviado"), Some(&2));
        assert_eq!(stats.status_breakdown.get("Pendiente"), Some(&1));

        let empty = ClientStats::for_client(&sample().swap_remove(2));
        assert_eq!(empty, ClientStats::default());
    }

    #[test]
    fn test_sort_labels_parse() {
        assert_eq!(ClientSort::RecentActivity.label(), "Actividad Reciente");
        assert_eq!("a-z".parse::<ClientSort>(), Ok(ClientSort::Alphabetical));
        assert_eq!("Más Pedidos".parse::<ClientSort>(), Ok(ClientSort::MostOrders));
        assert_eq!("newest".parse::<ClientSort>(), Ok(ClientSort::NewestClient));
        assert!("otro".parse::<ClientSort>().is_err());
    }

    #[tokio::test]
    async fn test_load_customers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/users/details/role/1");
                then.status(200).body(json!([sample()[0]]).to_string());
            })
            .await;

        let config = ApiConfig::new(&server.base_url()).unwrap();
        let client = ApiClient::new(&config, RetryPolicy::no_retry()).unwrap();
        let mut list = ClientList::new(UserRepository::new(client, Duration::from_secs(60)));
        assert_eq!(list.load().await.unwrap(), 1);
        mock.assert_async().await;
        assert_eq!(list.view("", ClientSort::default())[0].username, "carla");
    }
}
