//! Process-wide predicate kind registry.
//!
//! Kinds are registered once at startup (builtins are seeded on first use)
//! and the registry is read-mostly afterwards. Argument signatures resolve
//! through the kind's ancestor chain and are cached per (kind, type) pair
//! after the first lookup.

use crate::kinds::{self, KindOp};
use lazy_static::lazy_static;
use model::ValueType;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// How a kind declares its argument types per property value type.
#[derive(Debug, Clone)]
pub enum SignatureRule {
    /// An explicit table; a missing entry falls back to the parent kind.
    PerType(Vec<(ValueType, Vec<ValueType>)>),
    /// One argument of the property's own value type (`eq` and friends).
    Mirror,
    /// One list argument regardless of the property type (`in`).
    ListArg,
}

/// A named filter operator with typed argument signatures and an optional
/// parent kind for signature inheritance.
#[derive(Debug, Clone)]
pub struct PredicateKind {
    pub name: String,
    pub parent: Option<String>,
    pub signature: SignatureRule,
    pub op: KindOp,
}

impl PredicateKind {
    pub fn new(name: &str, signature: SignatureRule, op: KindOp) -> Self {
        PredicateKind {
            name: normalize_kind_name(name),
            parent: None,
            signature,
            op,
        }
    }

    /// A kind inheriting signatures from `parent` where its own table has
    /// no entry for the property type.
    pub fn child_of(name: &str, parent: &str, signature: SignatureRule, op: KindOp) -> Self {
        PredicateKind {
            name: normalize_kind_name(name),
            parent: Some(normalize_kind_name(parent)),
            signature,
            op,
        }
    }
}

#[derive(Default)]
struct PredicateRegistry {
    kinds: HashMap<String, Arc<PredicateKind>>,
}

impl PredicateRegistry {
    fn with_builtins() -> Self {
        let mut registry = PredicateRegistry::default();
        for kind in kinds::builtins() {
            registry.kinds.insert(kind.name.clone(), Arc::new(kind));
        }
        registry
    }
}

lazy_static! {
    static ref REGISTRY: RwLock<PredicateRegistry> =
        RwLock::new(PredicateRegistry::with_builtins());
    static ref SIGNATURES: RwLock<HashMap<(String, ValueType), Option<Vec<ValueType>>>> =
        RwLock::new(HashMap::new());
}

/// Register a kind under its normalized name. Intended for startup wiring;
/// later registrations shadow earlier ones of the same name.
pub fn register(kind: PredicateKind) {
    {
        let mut registry = REGISTRY.write().expect("predicate registry lock poisoned");
        registry.kinds.insert(kind.name.clone(), Arc::new(kind));
    }
    // A shadowing registration can change resolved signatures, for the kind
    // itself and for any kind inheriting from it, so the whole cache is
    // rebuilt on demand.
    SIGNATURES
        .write()
        .expect("signature cache lock poisoned")
        .clear();
}

/// Look up a kind by name. Names are normalized first, so `"BeginsWith"`,
/// `"begins_with"` and namespaced forms like `"text/BeginsWith"` all
/// resolve the same way. Returns `None` when nothing is registered; callers
/// raise their own `UnknownPredicate`.
pub fn kind_named(name: &str) -> Option<Arc<PredicateKind>> {
    let registry = REGISTRY.read().expect("predicate registry lock poisoned");
    registry.kinds.get(&normalize_kind_name(name)).cloned()
}

/// The argument types `kind` expects for a property of type `value_type`,
/// walking the ancestor chain until a kind declares the type. `None` when
/// the chain is exhausted.
pub fn signature_for(kind: &PredicateKind, value_type: ValueType) -> Option<Vec<ValueType>> {
    let key = (kind.name.clone(), value_type);
    if let Some(cached) = SIGNATURES
        .read()
        .expect("signature cache lock poisoned")
        .get(&key)
    {
        return cached.clone();
    }

    let resolved = resolve_signature(kind, value_type);
    SIGNATURES
        .write()
        .expect("signature cache lock poisoned")
        .entry(key)
        .or_insert_with(|| resolved.clone());
    resolved
}

fn resolve_signature(kind: &PredicateKind, value_type: ValueType) -> Option<Vec<ValueType>> {
    match &kind.signature {
        SignatureRule::Mirror => Some(vec![value_type]),
        SignatureRule::ListArg => Some(vec![ValueType::List]),
        SignatureRule::PerType(table) => {
            if let Some((_, args)) = table.iter().find(|(ty, _)| *ty == value_type) {
                return Some(args.clone());
            }
            let parent = kind.parent.as_deref().and_then(kind_named)?;
            resolve_signature(&parent, value_type)
        }
    }
}

/// Normalize a kind name: each `/`-separated part is snake_cased.
pub fn normalize_kind_name(name: &str) -> String {
    name.split('/')
        .map(snake_case)
        .collect::<Vec<_>>()
        .join("/")
}

fn snake_case(part: &str) -> String {
    let chars: Vec<char> = part.trim().chars().collect();
    let mut out = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) => {
                    p.is_ascii_lowercase()
                        || p.is_ascii_digit()
                        || (p.is_ascii_uppercase()
                            && next.is_some_and(|n| n.is_ascii_lowercase()))
                }
                None => false,
            };
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '-' || c == ' ' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}
