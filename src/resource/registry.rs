//! The set of registered resource kinds
//!
//! Adding a kind means adding one line to the `resource_kinds!` invocation
//! below; the sum type, its conversions and the standard factory registry
//! are generated from that list.

use super::{
    Entity, Factory, FactoryRegistry, Filter, Identity, Kind, Label, Log, Object, Observable,
    Observer, Policy, Resource, Semantic, Text, TextAddress, TextTree, Token,
};
use crate::error::Error;
use serde::{Serialize, Serializer};

macro_rules! resource_kinds {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// A resource of any registered kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum AnyResource {
            $($variant($ty)),+
        }

        impl AnyResource {
            pub fn kind(&self) -> Kind {
                match self {
                    $(AnyResource::$variant(_) => <$ty as Resource>::KIND),+
                }
            }

            pub fn identity(&self) -> &Identity {
                match self {
                    $(AnyResource::$variant(r) => r.identity()),+
                }
            }

            pub fn identity_mut(&mut self) -> &mut Identity {
                match self {
                    $(AnyResource::$variant(r) => r.identity_mut()),+
                }
            }

            pub fn collapse(&mut self) {
                match self {
                    $(AnyResource::$variant(r) => r.collapse()),+
                }
            }

            pub fn bind_persistence_id(&mut self) {
                match self {
                    $(AnyResource::$variant(r) => r.bind_persistence_id()),+
                }
            }
        }

        impl Serialize for AnyResource {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                match self {
                    $(AnyResource::$variant(r) => r.serialize(serializer)),+
                }
            }
        }

        $(
            impl From<$ty> for AnyResource {
                fn from(resource: $ty) -> Self {
                    AnyResource::$variant(resource)
                }
            }

            impl TryFrom<AnyResource> for $ty {
                type Error = AnyResource;

                fn try_from(any: AnyResource) -> std::result::Result<Self, AnyResource> {
                    match any {
                        AnyResource::$variant(resource) => Ok(resource),
                        other => Err(other),
                    }
                }
            }
        )+

        impl FactoryRegistry {
            /// Registry holding a factory for every built-in kind.
            pub fn standard() -> Self {
                let mut registry = FactoryRegistry::empty();
                $(registry.register(Factory::of::<$ty>());)+
                registry
            }
        }
    };
}

resource_kinds! {
    Entity(Entity),
    Label(Label),
    Filter(Filter),
    Policy(Policy),
    Observer(Observer),
    Observable(Observable),
    Semantic(Semantic),
    Object(Object),
    Text(Text),
    TextTree(TextTree),
    TextAddress(TextAddress),
    Token(Token),
    Error(Error),
    Log(Log),
}

impl AnyResource {
    pub fn id(&self) -> &str {
        &self.identity().id
    }

    pub fn label_ids(&self) -> &[String] {
        &self.identity().label_ids
    }

    /// Typed view of this resource, if it is of kind `R`.
    pub fn downcast<R: Resource>(self) -> Option<R> {
        R::try_from(self).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kind_dispatch() {
        let any: AnyResource = Label::fresh().into();
        assert_eq!(any.kind(), Kind::LABEL);
        assert_eq!(any.identity().kind, Kind::LABEL);
    }

    #[test]
    fn test_downcast() {
        let entity = Entity::fresh();
        let any = AnyResource::from(entity.clone());

        assert_eq!(any.clone().downcast::<Entity>(), Some(entity));
        assert_eq!(any.downcast::<Label>(), None);
    }

    #[test]
    fn test_serializes_as_inner_resource() {
        let mut label = Label::fresh();
        label.name = "space".to_string();
        let any = AnyResource::from(label.clone());

        assert_eq!(
            serde_json::to_value(&any).unwrap(),
            serde_json::to_value(&label).unwrap()
        );
    }

    #[test]
    fn test_standard_registry_covers_every_kind() {
        let registry = FactoryRegistry::standard();
        for kind in [
            Kind::ENTITY,
            Kind::LABEL,
            Kind::FILTER,
            Kind::POLICY,
            Kind::OBSERVER,
            Kind::OBSERVABLE,
            Kind::SEMANTIC,
            Kind::OBJECT,
            Kind::TEXT,
            Kind::TEXT_TREE,
            Kind::TEXT_ADDRESS,
            Kind::TOKEN,
            Kind::ERROR,
            Kind::LOG,
        ] {
            let factory = registry.get(kind.as_str()).unwrap();
            assert_eq!(factory.new_resource().kind(), kind);
        }
    }
}
