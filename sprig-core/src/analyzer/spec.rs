use std::cell::RefCell;
use std::fmt::{self, Display};
use std::rc::Rc;

/// Specs live in shared cells: every holder of a binding's spec sees the
/// refinements later usage makes to it.
pub type SpecRef = Rc<RefCell<TypeSpec>>;

/// Structural type descriptor, distinct from a runtime value's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    /// Wildcard: compatible with everything, never refined.
    Any,
    /// Not known yet; refined by the first concrete observation.
    Unknown,
    Void,
    Int,
    Bool,
    Char,
    Text,
    Array(SpecRef),
    Function {
        parameters: Vec<SpecRef>,
        returns: SpecRef,
    },
    /// Ordered member set, grown incrementally from declarations or from
    /// first usage.
    Object {
        members: Vec<(String, SpecRef)>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConflict {
    pub expected: String,
    pub got: String,
}

enum Merge {
    Keep,
    Replace,
    Conflict,
}

impl TypeSpec {
    pub fn cell(self) -> SpecRef {
        Rc::new(RefCell::new(self))
    }

    pub fn is_wild(&self) -> bool {
        matches!(self, TypeSpec::Any | TypeSpec::Unknown | TypeSpec::Void)
    }
}

/// Structural compatibility, wildcards passing everywhere.
pub fn compatible(a: &TypeSpec, b: &TypeSpec) -> bool {
    match (a, b) {
        (wild, _) if wild.is_wild() => true,
        (_, wild) if wild.is_wild() => true,
        (TypeSpec::Int, TypeSpec::Int)
        | (TypeSpec::Bool, TypeSpec::Bool)
        | (TypeSpec::Char, TypeSpec::Char)
        | (TypeSpec::Text, TypeSpec::Text) => true,
        (TypeSpec::Array(a), TypeSpec::Array(b)) => compatible(&a.borrow(), &b.borrow()),
        // a text is an array of characters
        (TypeSpec::Text, TypeSpec::Array(element))
        | (TypeSpec::Array(element), TypeSpec::Text) => {
            compatible(&element.borrow(), &TypeSpec::Char)
        },
        (
            TypeSpec::Function { parameters: a_params, returns: a_ret },
            TypeSpec::Function { parameters: b_params, returns: b_ret }
        ) => {
            a_params.len() == b_params.len()
                && a_params.iter().zip(b_params)
                    .all(|(a, b)| compatible(&a.borrow(), &b.borrow()))
                && compatible(&a_ret.borrow(), &b_ret.borrow())
        },
        (TypeSpec::Object { members: a }, TypeSpec::Object { members: b }) => {
            // members known on both sides must agree; one-sided members are
            // just not discovered yet
            a.iter().all(|(name, a_spec)| {
                match b.iter().find(|(b_name, _)| b_name == name) {
                    Some((_, b_spec)) => compatible(&a_spec.borrow(), &b_spec.borrow()),
                    None => true,
                }
            })
        },
        _ => false,
    }
}

/// "More specific of the two": merge an observation into a cell. On a
/// structural conflict the newer observation still wins, and the caller
/// reports the conflict as a remark.
pub fn refine(cell: &SpecRef, observed: &TypeSpec) -> Result<(), SpecConflict> {
    let merge = {
        let current = cell.borrow();

        match (&*current, observed) {
            // `any` is inert: it matches everything and learns nothing
            (TypeSpec::Any, _) => Merge::Keep,
            (_, observed) if observed.is_wild() => Merge::Keep,
            // only not-yet-known cells absorb a concrete observation
            (TypeSpec::Unknown | TypeSpec::Void, _) => Merge::Replace,
            (current, observed) if compatible(current, observed) => Merge::Keep,
            _ => Merge::Conflict,
        }
    };

    match merge {
        Merge::Keep => Ok(()),
        Merge::Replace => {
            *cell.borrow_mut() = observed.clone();
            Ok(())
        },
        Merge::Conflict => {
            let conflict = SpecConflict {
                expected: cell.borrow().to_string(),
                got: observed.to_string(),
            };

            *cell.borrow_mut() = observed.clone();
            Err(conflict)
        }
    }
}

/// The spec of `cell.name`. Accessing a member of a wildcard synthesizes a
/// fresh object spec holding exactly that member; later accesses extend it.
pub fn member(cell: &SpecRef, name: &str) -> Result<SpecRef, SpecConflict> {
    let found = {
        let current = cell.borrow();

        match &*current {
            TypeSpec::Object { members } => {
                members.iter()
                    .find(|(member_name, _)| member_name == name)
                    .map(|(_, spec)| Rc::clone(spec))
            },
            _ => None,
        }
    };

    if let Some(spec) = found {
        return Ok(spec);
    }

    let member_spec = TypeSpec::Unknown.cell();
    let mut current = cell.borrow_mut();

    match &mut *current {
        TypeSpec::Object { members } => {
            members.push((name.to_string(), Rc::clone(&member_spec)));
            Ok(member_spec)
        },
        // anything goes on a wildcard, and it stays a wildcard
        TypeSpec::Any => Ok(member_spec),
        TypeSpec::Unknown => {
            *current = TypeSpec::Object {
                members: vec![(name.to_string(), Rc::clone(&member_spec))],
            };
            Ok(member_spec)
        },
        concrete => Err(SpecConflict {
            expected: "an object".to_string(),
            got: concrete.to_string(),
        }),
    }
}

impl Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Any => write!(f, "any"),
            TypeSpec::Unknown => write!(f, "unknown"),
            TypeSpec::Void => write!(f, "void"),
            TypeSpec::Int => write!(f, "int"),
            TypeSpec::Bool => write!(f, "bool"),
            TypeSpec::Char => write!(f, "char"),
            TypeSpec::Text => write!(f, "text"),
            TypeSpec::Array(element) => write!(f, "[{}]", element.borrow()),
            TypeSpec::Function { parameters, returns } => {
                let parameters = parameters.iter()
                    .map(|parameter| parameter.borrow().to_string())
                    .collect::<Vec<String>>();

                write!(f, "fn({}) -> {}", parameters.join(", "), returns.borrow())
            },
            TypeSpec::Object { members } => {
                let members = members.iter()
                    .map(|(name, spec)| format!("{name}: {}", spec.borrow()))
                    .collect::<Vec<String>>();

                write!(f, "{{{}}}", members.join(", "))
            },
        }
    }
}
