//! Canned card API
//!
//! Answers search URLs with a JSON body filtered from a small built-in
//! catalogue and image URLs with a generated BMP in the card's color.

use percent_encoding::percent_decode_str;
use serde_json::json;
use tutor_core::http::{HttpClient, HttpError};

pub const SEARCH_URL: &str = "http://cards.sim/v1/cards?name=";
const IMAGE_PREFIX: &str = "http://cards.sim/img/";

/// Source images are stretched to the card area, so real card proportions
const IMAGE_WIDTH: u32 = 223;
const IMAGE_HEIGHT: u32 = 311;

const CATALOGUE: &[(&str, (u8, u8, u8))] = &[
    ("Lightning Bolt", (200, 40, 30)),
    ("Lightning Bolt", (200, 40, 30)),
    ("Shock", (220, 90, 40)),
    ("Counterspell", (40, 80, 200)),
    ("Llanowar Elves", (30, 150, 60)),
    ("Giant Growth", (60, 170, 70)),
    ("Dark Ritual", (60, 40, 70)),
    ("Swords to Plowshares", (230, 220, 190)),
    ("Serra Angel", (240, 230, 200)),
    ("Shivan Dragon", (180, 30, 30)),
    ("Jace, the Mind Sculptor", (50, 90, 210)),
    ("Birds of Paradise", (40, 160, 90)),
];

#[derive(Default)]
pub struct CannedApi;

fn search_body(query: &str) -> Vec<u8> {
    let query = query.to_lowercase();
    let cards: Vec<_> = CATALOGUE
        .iter()
        .enumerate()
        .filter(|(_, (name, _))| name.to_lowercase().contains(&query))
        .map(|(i, (name, _))| json!({ "name": name, "imageUrl": format!("{IMAGE_PREFIX}{i}") }))
        .collect();
    json!({ "cards": cards }).to_string().into_bytes()
}

/// 24-bit bottom-up BMP with a dark border
fn card_bmp((r, g, b): (u8, u8, u8)) -> Vec<u8> {
    let row_len = (IMAGE_WIDTH * 3).div_ceil(4) * 4;
    let image_len = row_len * IMAGE_HEIGHT;
    let mut out = Vec::with_capacity(54 + image_len as usize);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(54 + image_len).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&54u32.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&(IMAGE_WIDTH as i32).to_le_bytes());
    out.extend_from_slice(&(IMAGE_HEIGHT as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&[0; 24]);

    for y in 0..IMAGE_HEIGHT {
        for x in 0..IMAGE_WIDTH {
            let border = x < 8 || y < 8 || x >= IMAGE_WIDTH - 8 || y >= IMAGE_HEIGHT - 8;
            let (r, g, b) = if border { (20, 20, 20) } else { (r, g, b) };
            out.extend_from_slice(&[b, g, r]);
        }
        out.resize(out.len() + (row_len - IMAGE_WIDTH * 3) as usize, 0);
    }
    out
}

impl HttpClient for CannedApi {
    async fn get(&mut self, url: &str) -> Result<Vec<u8>, HttpError> {
        if let Some(query) = url.strip_prefix(SEARCH_URL) {
            let query = percent_decode_str(query).decode_utf8_lossy();
            if query.contains("offline") {
                return Err(HttpError::Connect);
            }
            return Ok(search_body(&query));
        }

        let index: usize = url
            .strip_prefix(IMAGE_PREFIX)
            .and_then(|i| i.parse().ok())
            .ok_or(HttpError::Status(404))?;
        let (_, color) = CATALOGUE.get(index).ok_or(HttpError::Status(404))?;
        Ok(card_bmp(*color))
    }
}
