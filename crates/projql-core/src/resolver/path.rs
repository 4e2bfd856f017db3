//! Dotted path resolution with alias rewriting and join caching.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use projql_proto::JoinKind;
use tracing::trace;

use super::IdentifierResolver;
use crate::config::ProcessorConfig;
use crate::criteria::{Expr, Navigator, NodeId};
use crate::error::{Error, Result};
use crate::shape::{validate_declarations, JoinDeclaration};

/// Resolves attribute paths against the nodes of one query build.
///
/// Resolution rewrites a leading alias until no alias matches, walks every
/// segment but the last as a join, and resolves the last segment as an
/// attribute of the final node. Joins are cached per `(node, attribute)` so
/// that paths sharing a prefix share the join. The join kind of a step is
/// taken from the longest declared prefix of the path up to and including
/// that step, or the configured default.
#[derive(Debug)]
pub struct PathResolver {
    aliases: HashMap<String, String>,
    join_kinds: HashMap<String, JoinKind>,
    joins: HashMap<(NodeId, String), NodeId>,
    default_join_kind: JoinKind,
    max_alias_rewrites: usize,
    skip_identifier_joins: bool,
    identifiers: Option<Arc<IdentifierResolver>>,
}

impl PathResolver {
    /// Create a resolver for the given join declarations.
    pub fn new(declarations: &[JoinDeclaration], config: &ProcessorConfig) -> Result<Self> {
        validate_declarations(declarations)?;

        let aliases = declarations
            .iter()
            .filter_map(|d| d.alias.clone().map(|alias| (alias, d.path.clone())))
            .collect();
        let mut resolver = Self {
            aliases,
            join_kinds: HashMap::new(),
            joins: HashMap::new(),
            default_join_kind: config.default_join_kind,
            max_alias_rewrites: config.max_alias_rewrites,
            skip_identifier_joins: config.skip_identifier_joins,
            identifiers: None,
        };

        // declared paths may themselves start with an alias
        for declaration in declarations {
            let path = resolver.rewrite_aliases(&declaration.path)?;
            resolver.join_kinds.insert(path, declaration.kind);
        }
        Ok(resolver)
    }

    /// Attach an identifier resolver, enabling the identifier shortcut when
    /// the configuration allows it.
    pub fn with_identifier_resolver(mut self, identifiers: Arc<IdentifierResolver>) -> Self {
        self.identifiers = Some(identifiers);
        self
    }

    /// Resolve `path` starting at `root`.
    pub fn resolve<N>(&mut self, nav: &mut N, root: NodeId, path: &str) -> Result<Expr>
    where
        N: Navigator + ?Sized,
    {
        let rewritten = self.rewrite_aliases(path)?;
        let segments: Vec<&str> = rewritten.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::InvalidPath(path.to_string()));
        }
        let Some((attribute, steps)) = segments.split_last() else {
            return Err(Error::InvalidPath(path.to_string()));
        };

        let mut node = root;
        let mut prefix = String::with_capacity(rewritten.len());
        for (i, segment) in steps.iter().enumerate() {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            let kind = self.join_kind(&prefix);

            if i + 1 == steps.len() {
                if let Some(expr) = self.identifier_shortcut(nav, node, segment, kind, attribute)? {
                    return Ok(expr);
                }
            }
            node = self.join(nav, node, segment, kind)?;
        }

        let expr = nav.get(node, attribute)?;
        trace!(path, resolved = %expr, "resolved path");
        Ok(expr)
    }

    /// Replace a leading alias until no alias matches the first segment.
    pub fn rewrite_aliases(&self, path: &str) -> Result<String> {
        let mut current = path.to_string();
        let mut seen = HashSet::new();
        loop {
            let (first, rest) = match current.split_once('.') {
                Some((first, rest)) => (first, Some(rest)),
                None => (current.as_str(), None),
            };
            let Some(target) = self.aliases.get(first) else {
                return Ok(current);
            };
            if !seen.insert(first.to_string()) || seen.len() > self.max_alias_rewrites {
                return Err(Error::AliasCycle {
                    alias: first.to_string(),
                    path: path.to_string(),
                });
            }
            current = match rest {
                Some(rest) => format!("{target}.{rest}"),
                None => target.clone(),
            };
        }
    }

    /// Join kind for the cumulative path `prefix`.
    pub fn join_kind(&self, prefix: &str) -> JoinKind {
        let mut candidate = prefix;
        loop {
            if let Some(kind) = self.join_kinds.get(candidate) {
                return *kind;
            }
            match candidate.rfind('.') {
                Some(end) => candidate = &candidate[..end],
                None => return self.default_join_kind,
            }
        }
    }

    /// Number of distinct joins created through this resolver.
    pub fn cached_joins(&self) -> usize {
        self.joins.len()
    }

    fn join<N>(&mut self, nav: &mut N, node: NodeId, attribute: &str, kind: JoinKind) -> Result<NodeId>
    where
        N: Navigator + ?Sized,
    {
        let key = (node, attribute.to_string());
        if let Some(existing) = self.joins.get(&key) {
            trace!(from = %node, attribute, node = %existing, "reusing join");
            return Ok(*existing);
        }
        let joined = nav.join(node, attribute, kind)?;
        self.joins.insert(key, joined);
        Ok(joined)
    }

    /// `relation.<identifier>` through a LEFT to-one relation reads the
    /// foreign key on the parent instead of joining.
    fn identifier_shortcut<N>(
        &self,
        nav: &N,
        node: NodeId,
        relation: &str,
        kind: JoinKind,
        attribute: &str,
    ) -> Result<Option<Expr>>
    where
        N: Navigator + ?Sized,
    {
        let Some(identifiers) = &self.identifiers else {
            return Ok(None);
        };
        if !self.skip_identifier_joins
            || kind != JoinKind::Left
            || self.joins.contains_key(&(node, relation.to_string()))
        {
            return Ok(None);
        }
        let Some(def) = nav.relation(node, relation)? else {
            return Ok(None);
        };
        if !def.is_to_one() || def.to_field != attribute {
            return Ok(None);
        }
        let target = nav.catalog().entity(&def.to_entity)?;
        if !identifiers.is_identifier(target, attribute) {
            return Ok(None);
        }
        trace!(from = %node, relation, attribute, "identifier read through foreign key");
        nav.get(node, &def.from_field).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, EntityDef, FieldDef, RelationDef, ScalarType, SchemaBundle};
    use crate::criteria::CriteriaQuery;

    fn catalog() -> Catalog {
        let customer = EntityDef::new("Customer", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int64))
            .with_field(FieldDef::scalar("name", ScalarType::String))
            .with_field(FieldDef::optional_scalar("address_id", ScalarType::Int64));
        let address = EntityDef::new("Address", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int64))
            .with_field(FieldDef::scalar("city", ScalarType::String))
            .with_field(FieldDef::scalar("zip", ScalarType::String));
        let order = EntityDef::new("Order", "id")
            .with_field(FieldDef::scalar("id", ScalarType::Int64))
            .with_field(FieldDef::scalar("customer_id", ScalarType::Int64));
        Catalog::new(
            SchemaBundle::new(1)
                .with_entity(customer)
                .with_entity(address)
                .with_entity(order)
                .with_relation(RelationDef::many_to_one(
                    "customer",
                    "Order",
                    "customer_id",
                    "Customer",
                    "id",
                ))
                .with_relation(RelationDef::many_to_one(
                    "address",
                    "Customer",
                    "address_id",
                    "Address",
                    "id",
                )),
        )
        .unwrap()
    }

    fn edge_kinds(query: &CriteriaQuery<'_>) -> Vec<(String, JoinKind)> {
        query
            .nodes()
            .iter()
            .filter_map(|n| n.edge.as_ref())
            .map(|e| (e.attribute.clone(), e.kind))
            .collect()
    }

    #[test]
    fn test_alias_rewrite_matches_expanded_path() {
        let catalog = catalog();
        let declarations = vec![
            JoinDeclaration::aliased("c", "customer", JoinKind::Inner),
            JoinDeclaration::aliased("addr", "c.address", JoinKind::Left),
        ];
        let mut resolver = PathResolver::new(&declarations, &ProcessorConfig::default()).unwrap();
        let mut query = CriteriaQuery::new(&catalog, "Order").unwrap();
        let root = query.root();

        let through_aliases = resolver.resolve(&mut query, root, "addr.city").unwrap();
        let expanded = resolver.resolve(&mut query, root, "customer.address.city").unwrap();
        assert_eq!(through_aliases, expanded);
        assert_eq!(query.join_count(), 2);
        assert_eq!(
            edge_kinds(&query),
            vec![
                ("customer".to_string(), JoinKind::Inner),
                ("address".to_string(), JoinKind::Left)
            ]
        );
        assert_eq!(
            resolver.rewrite_aliases("addr.city").unwrap(),
            "customer.address.city"
        );
    }

    #[test]
    fn test_join_dedup_for_shared_prefix() {
        let catalog = catalog();
        let mut resolver = PathResolver::new(&[], &ProcessorConfig::default()).unwrap();
        let mut query = CriteriaQuery::new(&catalog, "Order").unwrap();
        let root = query.root();

        resolver.resolve(&mut query, root, "customer.name").unwrap();
        resolver.resolve(&mut query, root, "customer.address.city").unwrap();
        resolver.resolve(&mut query, root, "customer.address.zip").unwrap();

        assert_eq!(query.join_count(), 2);
        assert_eq!(resolver.cached_joins(), 2);
    }

    #[test]
    fn test_join_kind_inherited_from_ancestor() {
        let catalog = catalog();
        let declarations = vec![JoinDeclaration::new("customer", JoinKind::Left)];
        let mut resolver = PathResolver::new(&declarations, &ProcessorConfig::default()).unwrap();
        let mut query = CriteriaQuery::new(&catalog, "Order").unwrap();
        let root = query.root();

        resolver.resolve(&mut query, root, "customer.address.city").unwrap();
        assert_eq!(
            edge_kinds(&query),
            vec![
                ("customer".to_string(), JoinKind::Left),
                ("address".to_string(), JoinKind::Left)
            ]
        );
    }

    #[test]
    fn test_more_specific_declaration_wins() {
        let catalog = catalog();
        let declarations = vec![
            JoinDeclaration::new("customer", JoinKind::Left),
            JoinDeclaration::new("customer.address", JoinKind::Inner),
        ];
        let mut resolver = PathResolver::new(&declarations, &ProcessorConfig::default()).unwrap();
        let mut query = CriteriaQuery::new(&catalog, "Order").unwrap();
        let root = query.root();

        resolver.resolve(&mut query, root, "customer.address.city").unwrap();
        assert_eq!(
            edge_kinds(&query),
            vec![
                ("customer".to_string(), JoinKind::Left),
                ("address".to_string(), JoinKind::Inner)
            ]
        );
    }

    #[test]
    fn test_default_join_kind_from_config() {
        let catalog = catalog();
        let config = ProcessorConfig::default().with_default_join_kind(JoinKind::Left);
        let mut resolver = PathResolver::new(&[], &config).unwrap();
        let mut query = CriteriaQuery::new(&catalog, "Order").unwrap();
        let root = query.root();

        resolver.resolve(&mut query, root, "customer.name").unwrap();
        assert_eq!(edge_kinds(&query), vec![("customer".to_string(), JoinKind::Left)]);
    }

    #[test]
    fn test_alias_cycle_is_rejected() {
        let declarations = vec![
            JoinDeclaration::aliased("a", "b.x", JoinKind::Inner),
            JoinDeclaration::aliased("b", "a.y", JoinKind::Inner),
        ];
        // the declared path "b.x" already loops back through "a"
        assert!(matches!(
            PathResolver::new(&declarations, &ProcessorConfig::default()),
            Err(Error::AliasCycle { alias, path }) if alias == "b" && path == "b.x"
        ));
    }

    #[test]
    fn test_alias_rewrite_bound() {
        let declarations = vec![
            JoinDeclaration::aliased("a", "b.x", JoinKind::Inner),
            JoinDeclaration::aliased("b", "c.y", JoinKind::Inner),
            JoinDeclaration::aliased("c", "customer", JoinKind::Inner),
        ];
        let config = ProcessorConfig::default().with_max_alias_rewrites(2);
        let resolver = PathResolver::new(&declarations, &config).unwrap();
        assert!(matches!(
            resolver.rewrite_aliases("a.name"),
            Err(Error::AliasCycle { .. })
        ));
    }

    #[test]
    fn test_unknown_attribute_and_empty_segment() {
        let catalog = catalog();
        let mut resolver = PathResolver::new(&[], &ProcessorConfig::default()).unwrap();
        let mut query = CriteriaQuery::new(&catalog, "Order").unwrap();
        let root = query.root();

        assert!(matches!(
            resolver.resolve(&mut query, root, "customer.nickname"),
            Err(Error::UnknownAttribute { attribute, .. }) if attribute == "nickname"
        ));
        assert!(matches!(
            resolver.resolve(&mut query, root, "customer..name"),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_identifier_shortcut_skips_left_join() {
        let catalog = catalog();
        let declarations = vec![JoinDeclaration::new("customer", JoinKind::Left)];
        let config = ProcessorConfig::default().with_skip_identifier_joins(true);
        let mut resolver = PathResolver::new(&declarations, &config)
            .unwrap()
            .with_identifier_resolver(Arc::new(IdentifierResolver::new()));
        let mut query = CriteriaQuery::new(&catalog, "Order").unwrap();
        let root = query.root();

        let expr = resolver.resolve(&mut query, root, "customer.id").unwrap();
        assert_eq!(expr, Expr::attribute(root, "customer_id"));
        assert_eq!(query.join_count(), 0);

        // once the join exists it is used
        resolver.resolve(&mut query, root, "customer.name").unwrap();
        let expr = resolver.resolve(&mut query, root, "customer.id").unwrap();
        assert_eq!(query.join_count(), 1);
        assert!(matches!(expr, Expr::Attribute { node, .. } if node != root));
    }

    #[test]
    fn test_identifier_shortcut_requires_left_join() {
        let catalog = catalog();
        let config = ProcessorConfig::default().with_skip_identifier_joins(true);
        let mut resolver = PathResolver::new(&[], &config)
            .unwrap()
            .with_identifier_resolver(Arc::new(IdentifierResolver::new()));
        let mut query = CriteriaQuery::new(&catalog, "Order").unwrap();
        let root = query.root();

        resolver.resolve(&mut query, root, "customer.id").unwrap();
        assert_eq!(query.join_count(), 1);
    }
}
