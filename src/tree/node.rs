//! Document Tree Nodes
//!
//! A closed set of node variants decoded from `imgdir` style exports.
//! Containers (groups and canvases) hold ordered, named children. Leaves keep
//! the raw text of their scalar, so parsing happens when a value is extracted.

use thiserror::Error;

/// Separator between segments of a child path (`"0/job/1"`)
pub const PATH_SEPARATOR: char = '/';

/// Structural failures while navigating or extracting from a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("child not found: {0}")]
    NotFound(String),
    #[error("node '{0}' is not a container")]
    NotContainer(String),
    #[error("node '{name}' is not {expected} node")]
    WrongVariant { name: String, expected: &'static str },
    #[error("node '{name}' has unparsable value '{value}'")]
    Parse { name: String, value: String },
}

/// A single node of a decoded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `<imgdir>`: plain container
    Group { name: String, children: Vec<Node> },
    /// `<canvas>`: image container, only its children matter here
    Canvas {
        name: String,
        width: String,
        height: String,
        children: Vec<Node>,
    },
    /// `<int>`
    Integer { name: String, value: String },
    /// `<string>`
    String { name: String, value: String },
    /// `<vector>`
    Point { name: String, x: String, y: String },
}

impl Node {
    pub fn group(name: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Group {
            name: name.into(),
            children,
        }
    }

    pub fn integer(name: impl Into<String>, value: impl Into<String>) -> Self {
        Node::Integer {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Node::String {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Group { name, .. }
            | Node::Canvas { name, .. }
            | Node::Integer { name, .. }
            | Node::String { name, .. }
            | Node::Point { name, .. } => name,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Node::Group { .. } | Node::Canvas { .. })
    }

    /// Ordered children of a container
    pub fn children(&self) -> Result<&[Node], TreeError> {
        match self {
            Node::Group { children, .. } | Node::Canvas { children, .. } => Ok(children),
            _ => Err(TreeError::NotContainer(self.name().to_string())),
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Group { children, .. } | Node::Canvas { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Resolve a child by name, or a `/`-separated path of names.
    ///
    /// Each segment is matched exactly against the immediate children of the
    /// node reached so far; the first match wins. Every intermediate node
    /// must be a container.
    pub fn child_by_name(&self, path: &str) -> Result<&Node, TreeError> {
        let Ok(children) = self.children() else {
            return Err(TreeError::NotFound(path.to_string()));
        };

        match path.split_once(PATH_SEPARATOR) {
            None => children
                .iter()
                .find(|c| c.name() == path)
                .ok_or_else(|| TreeError::NotFound(path.to_string())),
            Some((head, rest)) => {
                let child = self.child_by_name(head)?;
                if !child.is_container() {
                    return Err(TreeError::NotFound(path.to_string()));
                }
                child.child_by_name(rest)
            }
        }
    }

    fn integer_child(&self, name: &str) -> Result<&str, TreeError> {
        self.children()?
            .iter()
            .find_map(|c| match c {
                Node::Integer { name: n, value } if n == name => Some(value.as_str()),
                _ => None,
            })
            .ok_or_else(|| TreeError::NotFound(name.to_string()))
    }

    /// First integer leaf named `name` among the immediate children
    pub fn get_integer(&self, name: &str) -> Result<i32, TreeError> {
        let raw = self.integer_child(name)?;
        parse_i32(name, raw)
    }

    /// Integer leaf holding exactly `1` (true) or `0` (false)
    pub fn get_boolean(&self, name: &str) -> Result<bool, TreeError> {
        match self.get_integer(name)? {
            1 => Ok(true),
            0 => Ok(false),
            other => Err(TreeError::Parse {
                name: name.to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// Like [`Node::get_integer`], substituting `default` on any failure
    pub fn get_integer_or(&self, name: &str, default: i32) -> i32 {
        self.get_integer(name).unwrap_or(default)
    }

    /// First string leaf named `name` among the immediate children
    pub fn get_string(&self, name: &str) -> Result<String, TreeError> {
        self.children()?
            .iter()
            .find_map(|c| match c {
                Node::String { name: n, value } if n == name => Some(value.clone()),
                _ => None,
            })
            .ok_or_else(|| TreeError::NotFound(name.to_string()))
    }

    /// Value of this node, which must be an integer leaf
    pub fn as_integer(&self) -> Result<i32, TreeError> {
        match self {
            Node::Integer { name, value } => parse_i32(name, value),
            _ => Err(self.wrong_variant("an integer")),
        }
    }

    /// Value of this node, which must be a string leaf
    pub fn as_str(&self) -> Result<&str, TreeError> {
        match self {
            Node::String { value, .. } => Ok(value),
            _ => Err(self.wrong_variant("a string")),
        }
    }

    /// Value of a string leaf that holds a number
    pub fn as_integer_from_string(&self) -> Result<i32, TreeError> {
        let raw = self.as_str()?;
        parse_i32(self.name(), raw)
    }

    fn wrong_variant(&self, expected: &'static str) -> TreeError {
        TreeError::WrongVariant {
            name: self.name().to_string(),
            expected,
        }
    }
}

fn parse_i32(name: &str, raw: &str) -> Result<i32, TreeError> {
    raw.parse::<i32>().map_err(|_| TreeError::Parse {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::group(
            "1000",
            vec![
                Node::group(
                    "0",
                    vec![
                        Node::group("job", vec![Node::integer("0", "100"), Node::integer("1", "110")]),
                        Node::integer("lvmin", "10"),
                    ],
                ),
                Node::string("name", "Borrowing Sera's Mirror"),
                Node::integer("autoStart", "1"),
                Node::integer("autoComplete", "0"),
                Node::integer("weird", "2"),
                Node::integer("broken", "abc"),
            ],
        )
    }

    #[test]
    fn test_path_matches_chained_lookups() {
        let root = sample();
        let by_path = root.child_by_name("0/job/1").unwrap();
        let chained = root
            .child_by_name("0")
            .and_then(|n| n.child_by_name("job"))
            .and_then(|n| n.child_by_name("1"))
            .unwrap();
        assert_eq!(by_path, chained);
        assert_eq!(by_path.as_integer().unwrap(), 110);
    }

    #[test]
    fn test_path_through_leaf_is_not_found() {
        let root = sample();
        assert!(matches!(
            root.child_by_name("0/lvmin/x"),
            Err(TreeError::NotFound(_))
        ));
        assert!(matches!(root.child_by_name("missing"), Err(TreeError::NotFound(_))));
        let leaf = root.child_by_name("name").unwrap();
        assert!(matches!(leaf.child_by_name("x"), Err(TreeError::NotFound(_))));
    }

    #[test]
    fn test_get_boolean_is_strict() {
        let root = sample();
        assert_eq!(root.get_boolean("autoStart"), Ok(true));
        assert_eq!(root.get_boolean("autoComplete"), Ok(false));
        assert!(matches!(root.get_boolean("weird"), Err(TreeError::Parse { .. })));
        assert!(matches!(root.get_boolean("missing"), Err(TreeError::NotFound(_))));
        assert!(root.get_boolean("broken").is_err());
    }

    #[test]
    fn test_typed_extraction() {
        let root = sample();
        assert_eq!(root.get_string("name").unwrap(), "Borrowing Sera's Mirror");
        // String leaf does not satisfy an integer lookup
        assert!(root.get_integer("name").is_err());
        assert!(matches!(root.get_integer("broken"), Err(TreeError::Parse { .. })));
        assert_eq!(root.get_integer_or("broken", 7), 7);
        assert_eq!(root.get_integer_or("missing", -1), -1);
        assert_eq!(root.get_integer_or("weird", 0), 2);
    }

    #[test]
    fn test_leaf_conversions() {
        let buff = Node::string("buff", "2022109");
        assert_eq!(buff.as_integer_from_string().unwrap(), 2022109);
        assert!(matches!(buff.as_integer(), Err(TreeError::WrongVariant { .. })));
        assert!(matches!(buff.children(), Err(TreeError::NotContainer(_))));
    }
}
