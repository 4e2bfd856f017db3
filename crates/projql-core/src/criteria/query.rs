//! Criteria query: a root entity, its join tree and the assembled clauses.

use std::fmt;

use projql_proto::{JoinKind, Pagination};
use tracing::debug;

use super::expr::{Expr, Order, Predicate, Selection};
use crate::catalog::{Attribute, Catalog, RelationDef};
use crate::error::{Error, Result};

/// Build-scoped identity of a navigation node. The root is always node 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The query root.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in its query's arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The edge through which a non-root node was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinEdge {
    /// Node the join starts from.
    pub parent: NodeId,
    /// Relation attribute on the parent's entity.
    pub attribute: String,
    /// Join semantics.
    pub kind: JoinKind,
    /// Relation navigated by the join.
    pub relation: RelationDef,
}

/// A navigable node: the query root or a joined entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Entity the node ranges over.
    pub entity: String,
    /// Incoming join, `None` for the root.
    pub edge: Option<JoinEdge>,
}

/// Node and attribute primitives a path resolver navigates with.
pub trait Navigator {
    /// Catalog the nodes are validated against.
    fn catalog(&self) -> &Catalog;

    /// Name of the entity `node` ranges over.
    fn entity_name(&self, node: NodeId) -> Result<&str>;

    /// Create a join from `from` through the relation `attribute`.
    fn join(&mut self, from: NodeId, attribute: &str, kind: JoinKind) -> Result<NodeId>;

    /// Resolve a scalar attribute of `node` into an expression.
    fn get(&self, node: NodeId, attribute: &str) -> Result<Expr> {
        let entity = self.entity_name(node)?;
        match self.catalog().attribute(entity, attribute)? {
            Attribute::Field(_) => Ok(Expr::attribute(node, attribute)),
            Attribute::Relation(_) => Err(Error::NotAValue {
                entity: entity.to_string(),
                attribute: attribute.to_string(),
            }),
        }
    }

    /// Relation named `attribute` on the entity of `node`, if any.
    fn relation(&self, node: NodeId, attribute: &str) -> Result<Option<&RelationDef>> {
        Ok(self.catalog().relation(self.entity_name(node)?, attribute))
    }
}

/// A query under construction against a [`Catalog`].
///
/// Nodes live in an arena addressed by [`NodeId`]; every call to
/// [`Navigator::join`] appends one node, so joins are never deduplicated here.
#[derive(Debug, Clone)]
pub struct CriteriaQuery<'c> {
    catalog: &'c Catalog,
    nodes: Vec<Node>,
    /// Output columns in order.
    pub selections: Vec<Selection>,
    /// Grouping expressions.
    pub group_by: Vec<Expr>,
    /// Row filter.
    pub predicate: Option<Predicate>,
    /// Sort keys in priority order.
    pub orders: Vec<Order>,
    /// Drop duplicate output rows.
    pub distinct: bool,
    /// Offset and limit.
    pub pagination: Option<Pagination>,
}

impl<'c> CriteriaQuery<'c> {
    /// Create a query rooted at `entity`.
    pub fn new(catalog: &'c Catalog, entity: &str) -> Result<Self> {
        let def = catalog.entity(entity)?;
        Ok(Self {
            catalog,
            nodes: vec![Node {
                entity: def.name.clone(),
                edge: None,
            }],
            selections: Vec::new(),
            group_by: Vec::new(),
            predicate: None,
            orders: Vec::new(),
            distinct: false,
            pagination: None,
        })
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Entity of the root node.
    pub fn root_entity(&self) -> &str {
        &self.nodes[0].entity
    }

    /// All nodes, root first. A join's parent always precedes it.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Get a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Number of joins created so far.
    pub fn join_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Check if any selection is an aggregate.
    pub fn is_aggregate(&self) -> bool {
        self.selections.iter().any(|s| s.expr.is_aggregate())
    }
}

impl Navigator for CriteriaQuery<'_> {
    fn catalog(&self) -> &Catalog {
        self.catalog
    }

    fn entity_name(&self, node: NodeId) -> Result<&str> {
        self.node(node)
            .map(|n| n.entity.as_str())
            .ok_or(Error::UnknownNode(node))
    }

    fn join(&mut self, from: NodeId, attribute: &str, kind: JoinKind) -> Result<NodeId> {
        let entity = self.entity_name(from)?;
        let relation = match self.catalog.attribute(entity, attribute)? {
            Attribute::Relation(relation) => relation.clone(),
            Attribute::Field(_) => {
                return Err(Error::NotARelation {
                    entity: entity.to_string(),
                    attribute: attribute.to_string(),
                })
            }
        };

        let id = NodeId(self.nodes.len() as u32);
        debug!(
            from = %from,
            attribute,
            kind = %kind,
            target = %relation.to_entity,
            node = %id,
            "creating join"
        );
        self.nodes.push(Node {
            entity: relation.to_entity.clone(),
            edge: Some(JoinEdge {
                parent: from,
                attribute: attribute.to_string(),
                kind,
                relation,
            }),
        });
        Ok(id)
    }
}
