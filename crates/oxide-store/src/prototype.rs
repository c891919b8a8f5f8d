//! Prototype registry: table names, table schemas and the type hierarchy.

use core::any::TypeId;
use std::collections::HashMap;

use oxide_store_sql::{Column, DataType, TableSchema};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::field::{Field, FieldVisitor, Persistent};

/// Registered description of one stored type.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    /// Prototype and table name.
    pub name: String,
    /// Rust type name.
    pub type_name: &'static str,
    /// Parent prototype for derived types.
    pub parent: Option<String>,
    /// Table layout.
    pub schema: TableSchema,
    /// Relation item prototypes owned by this prototype, as `(field, prototype)`.
    pub relations: Vec<(String, String)>,
    /// Owning prototype, for relation item prototypes.
    pub owner: Option<String>,
}

impl Prototype {
    /// Name of the identifier column.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.schema.identifier().map_or("id", |c| c.name.as_str())
    }

    /// Whether this prototype stores has-many items.
    #[must_use]
    pub const fn is_relation(&self) -> bool {
        self.owner.is_some()
    }
}

/// Table name of the items of a has-many field.
#[must_use]
pub fn relation_table(owner: &str, field: &str) -> String {
    format!("{owner}_{field}")
}

/// Foreign-key column pointing from a relation item to its owner.
#[must_use]
pub fn owner_column(owner: &str) -> String {
    format!("{owner}_id")
}

/// Column holding the value of a relation item.
pub const ITEM_COLUMN: &str = "value";

/// Builds a table schema by visiting a default object.
pub(crate) struct SchemaBuilder {
    schema: TableSchema,
    has_identifier: bool,
    relations: Vec<(String, TableSchema)>,
}

impl SchemaBuilder {
    pub(crate) fn new(table: &str) -> Self {
        Self {
            schema: TableSchema::new(table),
            has_identifier: false,
            relations: Vec::new(),
        }
    }

    pub(crate) fn into_schema(self) -> TableSchema {
        self.schema
    }
}

impl FieldVisitor for SchemaBuilder {
    fn visit(&mut self, name: &str, field: Field<'_>) {
        match field {
            Field::Identifier(_) => {
                self.has_identifier = true;
                self.schema.push(Column::identifier(name, DataType::Long));
            }
            Field::Scalar(scalar) => {
                let mut column = Column::typed(name, scalar.data_type());
                column.size = scalar.size();
                self.schema.push(column);
            }
            Field::Object(_) => self.schema.push(Column::typed(name, DataType::Long)),
            Field::Relation(relation) => {
                let table = relation_table(&self.schema.name, name);
                let schema = relation.item_schema(&table, &owner_column(&self.schema.name));
                self.relations.push((String::from(name), schema));
            }
        }
    }
}

/// All prototypes of one store, in registration order.
#[derive(Debug, Default)]
pub(crate) struct PrototypeRegistry {
    prototypes: Vec<Prototype>,
    by_type: HashMap<TypeId, String>,
}

impl PrototypeRegistry {
    pub(crate) fn attach<T: Persistent>(&mut self, name: &str, parent: Option<&str>) -> Result<()> {
        let type_name = core::any::type_name::<T>();
        if self.get(name).is_some() {
            return Err(StoreError::PrototypeExists(String::from(name)));
        }
        if let Some(existing) = self.by_type.get(&TypeId::of::<T>()) {
            return Err(StoreError::PrototypeExists(existing.clone()));
        }
        if let Some(parent) = parent {
            if self.get(parent).is_none() {
                return Err(StoreError::PrototypeNotFound(String::from(parent)));
            }
        }

        let mut builder = SchemaBuilder::new(name);
        T::default().visit_fields(&mut builder);
        if !builder.has_identifier {
            return Err(StoreError::MissingIdentifier(String::from(type_name)));
        }
        if let Some((_, schema)) = builder
            .relations
            .iter()
            .find(|(_, schema)| self.get(&schema.name).is_some())
        {
            return Err(StoreError::PrototypeExists(schema.name.clone()));
        }

        let relations = builder
            .relations
            .iter()
            .map(|(field, schema)| (field.clone(), schema.name.clone()))
            .collect();
        for (_, schema) in builder.relations {
            debug!(prototype = %schema.name, owner = name, "attaching relation prototype");
            self.prototypes.push(Prototype {
                name: schema.name.clone(),
                type_name,
                parent: None,
                schema,
                relations: Vec::new(),
                owner: Some(String::from(name)),
            });
        }
        debug!(prototype = name, type_name, "attaching prototype");
        self.prototypes.push(Prototype {
            name: String::from(name),
            type_name,
            parent: parent.map(String::from),
            schema: builder.schema,
            relations,
            owner: None,
        });
        self.by_type.insert(TypeId::of::<T>(), String::from(name));
        Ok(())
    }

    /// Removes a prototype and its relation prototypes.
    ///
    /// `in_use` reports whether any object is stored under a prototype name.
    pub(crate) fn detach(&mut self, name: &str, in_use: impl Fn(&str) -> bool) -> Result<()> {
        let prototype = self
            .get(name)
            .ok_or_else(|| StoreError::PrototypeNotFound(String::from(name)))?;
        if prototype.is_relation()
            || !self.children(name).is_empty()
            || in_use(name)
            || prototype.relations.iter().any(|(_, r)| in_use(r))
        {
            return Err(StoreError::PrototypeInUse(String::from(name)));
        }
        let doomed: Vec<String> = std::iter::once(String::from(name))
            .chain(prototype.relations.iter().map(|(_, r)| r.clone()))
            .collect();
        self.prototypes.retain(|p| !doomed.contains(&p.name));
        self.by_type.retain(|_, n| n != name);
        debug!(prototype = name, "detached prototype");
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Prototype> {
        self.prototypes.iter().find(|p| p.name == name)
    }

    pub(crate) fn name_of(&self, type_id: TypeId) -> Option<&str> {
        self.by_type.get(&type_id).map(String::as_str)
    }

    pub(crate) fn children(&self, name: &str) -> Vec<String> {
        self.prototypes
            .iter()
            .filter(|p| p.parent.as_deref() == Some(name))
            .map(|p| p.name.clone())
            .collect()
    }

    pub(crate) fn all(&self) -> &[Prototype] {
        &self.prototypes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Attribute, Identifier, Varchar};
    use crate::relation::HasMany;

    #[derive(Debug, Default)]
    struct Person {
        id: Identifier,
        name: Varchar<255>,
        age: i32,
        nicknames: HasMany<String>,
    }

    impl Persistent for Person {
        fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) {
            visitor.visit("id", self.id.field());
            visitor.visit("name", self.name.field());
            visitor.visit("age", self.age.field());
            visitor.visit("nicknames", self.nicknames.field());
        }
    }

    #[derive(Debug, Default)]
    struct Student {
        id: Identifier,
        school: String,
    }

    impl Persistent for Student {
        fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) {
            visitor.visit("id", self.id.field());
            visitor.visit("school", self.school.field());
        }
    }

    #[derive(Debug, Default)]
    struct Anonymous {
        text: String,
    }

    impl Persistent for Anonymous {
        fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) {
            visitor.visit("text", self.text.field());
        }
    }

    #[test]
    fn test_attach_builds_schema() {
        let mut registry = PrototypeRegistry::default();
        registry.attach::<Person>("person", None).unwrap();

        let person = registry.get("person").unwrap();
        assert_eq!(person.schema.column_names(), ["id", "name", "age"]);
        assert!(person.schema.columns[0].identifier);
        assert_eq!(person.schema.columns[1].size, Some(255));
        assert_eq!(
            person.relations,
            [(String::from("nicknames"), String::from("person_nicknames"))]
        );

        let items = registry.get("person_nicknames").unwrap();
        assert_eq!(items.schema.column_names(), ["id", "person_id", "value"]);
        assert_eq!(items.owner.as_deref(), Some("person"));
        assert_eq!(registry.name_of(TypeId::of::<Person>()), Some("person"));
    }

    #[test]
    fn test_attach_twice_fails() {
        let mut registry = PrototypeRegistry::default();
        registry.attach::<Person>("person", None).unwrap();
        assert_eq!(
            registry.attach::<Person>("people", None),
            Err(StoreError::PrototypeExists(String::from("person")))
        );
        assert_eq!(
            registry.attach::<Student>("person", None),
            Err(StoreError::PrototypeExists(String::from("person")))
        );
    }

    #[test]
    fn test_derived_prototypes() {
        let mut registry = PrototypeRegistry::default();
        assert!(matches!(
            registry.attach::<Student>("student", Some("person")),
            Err(StoreError::PrototypeNotFound(_))
        ));
        registry.attach::<Person>("person", None).unwrap();
        registry.attach::<Student>("student", Some("person")).unwrap();
        assert_eq!(registry.children("person"), ["student"]);

        assert_eq!(
            registry.detach("person", |_| false),
            Err(StoreError::PrototypeInUse(String::from("person")))
        );
        registry.detach("student", |_| false).unwrap();
        registry.detach("person", |_| false).unwrap();
        assert!(registry.all().is_empty());
    }

    #[test]
    fn test_detach_refused_while_objects_exist() {
        let mut registry = PrototypeRegistry::default();
        registry.attach::<Person>("person", None).unwrap();
        assert!(registry.detach("person", |name| name == "person_nicknames").is_err());
        assert!(registry.detach("person_nicknames", |_| false).is_err());
        assert!(matches!(
            registry.detach("nobody", |_| false),
            Err(StoreError::PrototypeNotFound(_))
        ));
    }

    #[test]
    fn test_missing_identifier() {
        let mut registry = PrototypeRegistry::default();
        assert!(matches!(
            registry.attach::<Anonymous>("anonymous", None),
            Err(StoreError::MissingIdentifier(_))
        ));
    }
}
