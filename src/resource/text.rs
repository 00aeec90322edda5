//! Textual object kinds

use super::{Kind, ObjectBody, ObjectOf};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl ObjectBody for TextContent {
    const KIND: Kind = Kind::TEXT;
    const FIELDS: &'static [&'static str] = &["text"];
}

pub type Text = ObjectOf<TextContent>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Bounding polygon of a text block on its page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertices: Vec<Vertex>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boxes: Vec<BoundingBox>,
}

/// One page of a paginated document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub number: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeContent {
    #[serde(flatten)]
    pub text: TextContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,
}

impl ObjectBody for TreeContent {
    const KIND: Kind = Kind::TEXT_TREE;
    const FIELDS: &'static [&'static str] = &["text", "pages"];
}

pub type TextTree = ObjectOf<TreeContent>;

/// Postal address parsed out of free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub normalized: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street_altnumber: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street_predir: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street_postdir: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressContent {
    #[serde(flatten)]
    pub text: TextContent,
    #[serde(flatten)]
    pub address: Address,
}

impl ObjectBody for AddressContent {
    const KIND: Kind = Kind::TEXT_ADDRESS;
    const FIELDS: &'static [&'static str] = &[
        "text",
        "normalized",
        "name",
        "street",
        "street_number",
        "street_altnumber",
        "street_predir",
        "street_postdir",
        "street_name",
        "street_type",
        "city",
        "state",
        "zip",
    ];
}

pub type TextAddress = ObjectOf<AddressContent>;
