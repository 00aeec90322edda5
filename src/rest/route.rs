use super::{IdStyle, ACTION_DELIMITER};

/// Resource path below the base path: `/kind[:action][/id...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub kind: String,
    pub action: Option<String>,
    /// Remainder after the kind segment, with its leading slash.
    pub rest: Option<String>,
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let (head, rest) = match path.find('/') {
            Some(index) => (&path[..index], Some(&path[index..])),
            None => (path, None),
        };
        let (kind, action) = match head.split_once(ACTION_DELIMITER) {
            Some((kind, action)) => (kind, Some(action)),
            None => (head, None),
        };
        if kind.is_empty() || action.is_some_and(str::is_empty) {
            return None;
        }
        Some(Self {
            kind: kind.to_string(),
            action: action.map(str::to_string),
            rest: rest.filter(|rest| *rest != "/").map(str::to_string),
        })
    }

    /// Id for an action with the given style; `None` when the path carries none.
    pub fn id(&self, style: IdStyle) -> Option<String> {
        let rest = self.rest.as_deref()?;
        let id = match style {
            IdStyle::Identifier => rest.trim_start_matches('/').to_string(),
            IdStyle::Path => rest.to_string(),
        };
        (!id.trim_matches('/').is_empty()).then_some(id)
    }

    pub fn has_id(&self) -> bool {
        self.id(IdStyle::Identifier).is_some()
    }
}
