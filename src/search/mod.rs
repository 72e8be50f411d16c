//! Place search, proxied through the backend so provider credentials never
//! reach the browser. The provider is an opaque collaborator behind the
//! [`SearchGateway`] trait; tests swap in a canned implementation.

use std::str::FromStr;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::error;
use regex::Regex;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::Place;

/// Results requested from the provider per search.
pub const SEARCH_RESULT_LIMIT: u32 = 5;

lazy_static! {
    static ref MARKUP_TAGS: Regex = Regex::new(r"<[^>]*>").unwrap();
}

#[async_trait]
pub trait SearchGateway: Send + Sync {
    async fn search(&self, query: &str, rect: Option<&Rect>) -> Result<Vec<Place>, AppError>;
}

/// Bounding rectangle limiting a search to the visible map area.
#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Rect {
    pub fn to_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

impl FromStr for Rect {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(AppError::InvalidInput(format!(
                "rect must be minLon,minLat,maxLon,maxLat, got {s:?}"
            )));
        }

        let mut coords = [0f64; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            let value: f64 = part.parse().map_err(|_| {
                AppError::InvalidInput(format!("rect coordinate {part:?} is not a number"))
            })?;
            if !value.is_finite() {
                return Err(AppError::InvalidInput(format!(
                    "rect coordinate {part:?} is not finite"
                )));
            }
            *slot = value;
        }

        let [min_lon, min_lat, max_lon, max_lat] = coords;
        if min_lon >= max_lon || min_lat >= max_lat {
            return Err(AppError::InvalidInput(
                "rect minimum corner must be south-west of the maximum corner".to_string(),
            ));
        }

        Ok(Rect {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    #[serde(default)]
    items: Vec<ProviderItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderItem {
    title: String,
    #[serde(default)]
    link: String,
    address: String,
    #[serde(default)]
    road_address: String,
    #[serde(default)]
    mapx: String,
    #[serde(default)]
    mapy: String,
}

// Provider titles embed <b> markup around the matched keyword
fn strip_markup(title: &str) -> String {
    MARKUP_TAGS.replace_all(title, "").to_string()
}

/// Map a provider item onto our place shape. The provider serves coordinates
/// as WGS84 scaled by 1e7, and leaves road_address blank for places that only
/// have a lot-number address.
fn place_from_item(item: ProviderItem) -> Place {
    let name = strip_markup(&item.title);
    let road_address = match item.road_address.trim() {
        "" => None,
        road => Some(road.to_string()),
    };
    let latitude = item.mapy.parse::<f64>().unwrap_or(0.0) * 1e-7;
    let longitude = item.mapx.parse::<f64>().unwrap_or(0.0) * 1e-7;

    Place {
        id: Place::derive_id(&name, &item.address),
        name,
        address: item.address,
        road_address,
        url: item.link,
        latitude,
        longitude,
    }
}

pub struct NaverLocalSearch {
    http: reqwest::Client,
    api_url: String,
    client_id: String,
    client_secret: String,
}

impl NaverLocalSearch {
    pub fn new(api_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            client_id,
            client_secret,
        }
    }
}

#[async_trait]
impl SearchGateway for NaverLocalSearch {
    async fn search(&self, query: &str, rect: Option<&Rect>) -> Result<Vec<Place>, AppError> {
        let mut params = vec![
            ("query".to_string(), query.to_string()),
            ("display".to_string(), SEARCH_RESULT_LIMIT.to_string()),
        ];
        if let Some(rect) = rect {
            params.push(("rect".to_string(), rect.to_param()));
        }

        let response = self
            .http
            .get(&self.api_url)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                error!("Search provider unreachable: {e}");
                AppError::Upstream(format!("search provider unreachable: {e}"))
            })?;

        if !response.status().is_success() {
            error!("Search provider returned {}", response.status());
            return Err(AppError::Upstream(format!(
                "search provider returned {}",
                response.status()
            )));
        }

        let body: ProviderResponse = response.json().await.map_err(|e| {
            error!("Search provider sent an unreadable body: {e}");
            AppError::Upstream(format!("search provider sent an unreadable body: {e}"))
        })?;

        Ok(body.items.into_iter().map(place_from_item).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_parses_the_query_form() {
        let rect: Rect = "126.9,37.4,127.1,37.6".parse().unwrap();
        assert_eq!(
            rect,
            Rect {
                min_lon: 126.9,
                min_lat: 37.4,
                max_lon: 127.1,
                max_lat: 37.6,
            }
        );
        assert_eq!(rect.to_param(), "126.9,37.4,127.1,37.6");
    }

    #[test]
    fn rect_rejects_malformed_input() {
        assert!("126.9,37.4,127.1".parse::<Rect>().is_err());
        assert!("a,b,c,d".parse::<Rect>().is_err());
        // Inverted corners
        assert!("127.1,37.4,126.9,37.6".parse::<Rect>().is_err());
        assert!("126.9,37.6,127.1,37.4".parse::<Rect>().is_err());
        // NaN parses as an f64 and would slip through the corner comparison
        assert!("NaN,NaN,NaN,NaN".parse::<Rect>().is_err());
        assert!("-inf,37.4,inf,37.6".parse::<Rect>().is_err());
    }

    #[test]
    fn provider_items_become_places() {
        let item = ProviderItem {
            title: "<b>Gamsung</b> Taco".to_string(),
            link: "https://example.com/gamsung".to_string(),
            address: "Seoul Mapo-gu Seogyo-dong 123-4".to_string(),
            road_address: "Seoul Mapo-gu Wausan-ro 5".to_string(),
            mapx: "1269214591".to_string(),
            mapy: "375534255".to_string(),
        };

        let place = place_from_item(item);

        assert_eq!(place.name, "Gamsung Taco");
        assert_eq!(
            place.id,
            Place::derive_id("Gamsung Taco", "Seoul Mapo-gu Seogyo-dong 123-4")
        );
        assert_eq!(place.road_address.as_deref(), Some("Seoul Mapo-gu Wausan-ro 5"));
        assert_eq!(place.url, "https://example.com/gamsung");
        assert!((place.longitude - 126.9214591).abs() < 1e-9);
        assert!((place.latitude - 37.5534255).abs() < 1e-9);
    }

    #[test]
    fn blank_road_address_maps_to_none() {
        let item = ProviderItem {
            title: "Plain".to_string(),
            link: String::new(),
            address: "Somewhere 1".to_string(),
            road_address: "  ".to_string(),
            mapx: String::new(),
            mapy: String::new(),
        };

        let place = place_from_item(item);

        assert_eq!(place.road_address, None);
        assert_eq!(place.latitude, 0.0);
        assert_eq!(place.longitude, 0.0);
    }

    #[test]
    fn provider_body_without_items_is_an_empty_result() {
        let body: ProviderResponse = serde_json::from_str("{}").unwrap();
        assert!(body.items.is_empty());
    }
}
