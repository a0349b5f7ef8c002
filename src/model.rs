use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
}

impl CreateUserInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Sample users for the `demo` command.
pub const PRESET_USERS: [(&str, &str); 16] = [
    ("Kazuma Kiryu", "kiryu@yakuza.jp"),
    ("R2-D2", "r2d2@rebelsgalaxy.xyz"),
    ("Gordon Freeman", "gordon@blackmesa.gov"),
    ("Doom Guy", "destroyerofdemons@doom.com"),
    ("Samus Aran", "samus@galactic-federation.org"),
    ("Link", "hero@hyrulekingdom.com"),
    ("Geralt of Rivia", "geralt@witcherschool.com"),
    ("Solid Snake", "thisisjustabox@foxhound.mil"),
    ("Gearless Joe", "joe@megalobox.com"),
    ("Frieren", "frieren@magic.com"),
    ("Laios", "laios@meshi.com"),
    ("Mob", "mob@psycho.com"),
    ("Harrier Du Bois", "drunkcop@elyisum.com"),
    ("Gregory House", "vicodinlover@princetonp.hospital"),
    ("John Marston", "john@wild-west.com"),
    ("Dante", "pizza123@dmc.com"),
];

pub fn random_preset() -> CreateUserInput {
    let (name, email) = PRESET_USERS[rand::rng().random_range(0..PRESET_USERS.len())];
    CreateUserInput::new(name, email)
}

/// The four wire protocols a user record can travel over.
///
/// Serialized with the labels shown in a trace (`REST`, `GraphQL`,
/// `JSON-RPC`, `RPC`); parsed from the selector identifiers `rest`,
/// `graphql`, `jsonrpc` and `trpc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    #[serde(rename = "REST")]
    Rest,
    #[serde(rename = "GraphQL")]
    GraphQl,
    #[serde(rename = "JSON-RPC")]
    JsonRpc,
    #[serde(rename = "RPC")]
    Trpc,
}

impl Transport {
    pub const ALL: [Transport; 4] = [
        Transport::Rest,
        Transport::GraphQl,
        Transport::JsonRpc,
        Transport::Trpc,
    ];

    /// Label used in traces and metrics.
    pub fn label(self) -> &'static str {
        match self {
            Transport::Rest => "REST",
            Transport::GraphQl => "GraphQL",
            Transport::JsonRpc => "JSON-RPC",
            Transport::Trpc => "RPC",
        }
    }

    /// Identifier accepted by the selector and the CLI.
    pub fn id(self) -> &'static str {
        match self {
            Transport::Rest => "rest",
            Transport::GraphQl => "graphql",
            Transport::JsonRpc => "jsonrpc",
            Transport::Trpc => "trpc",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport '{0}' (expected rest, graphql, jsonrpc or trpc)")]
pub struct UnknownTransport(pub String);

impl FromStr for Transport {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Transport::Rest),
            "graphql" => Ok(Transport::GraphQl),
            "jsonrpc" | "json-rpc" => Ok(Transport::JsonRpc),
            "trpc" | "rpc" => Ok(Transport::Trpc),
            _ => Err(UnknownTransport(s.to_string())),
        }
    }
}

/// Audit record of one call's wire-level input and output.
///
/// `request_wire` and `response_wire` hold the payloads exactly as they
/// crossed the network. A response body that is not JSON is kept as a JSON
/// string of its raw text; a call that never got a response has
/// `response_wire == Value::Null` and no `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub transport: Transport,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
    pub request_wire: Value,
    pub response_wire: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallResult<T> {
    pub data: T,
    pub trace: Trace,
}
