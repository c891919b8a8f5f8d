//! Tests for the `#[derive(Persistent)]` macro output.

use oxide_store::sql::DataType;
use oxide_store::{
    Field, FieldVisitor, HasMany, Identifier, ObjectPtr, ObjectStore, Persistent, StoreError,
    Varchar,
};

#[derive(Debug, Default, Persistent)]
struct Customer {
    id: Identifier,
    #[persist(name = "full_name")]
    name: Varchar<80>,
    vip: bool,
    #[persist(skip)]
    cached_score: u32,
    referrer: ObjectPtr<Customer>,
    emails: HasMany<String>,
}

#[derive(Debug, Default, Persistent)]
struct Anonymous {
    label: String,
}

#[derive(Default)]
struct Names(Vec<(String, &'static str)>);

impl FieldVisitor for Names {
    fn visit(&mut self, name: &str, field: Field<'_>) {
        let kind = match field {
            Field::Identifier(_) => "identifier",
            Field::Scalar(_) => "scalar",
            Field::Object(_) => "object",
            Field::Relation(_) => "relation",
        };
        self.0.push((String::from(name), kind));
    }
}

#[test]
fn test_fields_visited_in_declaration_order() {
    let mut names = Names::default();
    Customer::default().visit_fields(&mut names);
    assert_eq!(
        names.0,
        [
            (String::from("id"), "identifier"),
            (String::from("full_name"), "scalar"),
            (String::from("vip"), "scalar"),
            (String::from("referrer"), "object"),
            (String::from("emails"), "relation"),
        ]
    );
}

#[test]
fn test_derived_schema() {
    let store = ObjectStore::new();
    store.attach::<Customer>("customer").unwrap();

    let prototype = store.prototype("customer").unwrap();
    assert_eq!(prototype.schema.column_names(), ["id", "full_name", "vip", "referrer"]);
    assert_eq!(prototype.identifier(), "id");
    let name = prototype.schema.column("full_name").unwrap();
    assert_eq!(name.data_type, Some(DataType::Varchar));
    assert_eq!(name.size, Some(80));
    assert_eq!(prototype.schema.column("referrer").unwrap().data_type, Some(DataType::Long));
    assert_eq!(prototype.relations, [(String::from("emails"), String::from("customer_emails"))]);

    let emails = store.prototype("customer_emails").unwrap();
    assert_eq!(emails.schema.column_names(), ["id", "customer_id", "value"]);
    assert_eq!(emails.owner.as_deref(), Some("customer"));
}

#[test]
fn test_skipped_field_keeps_value() {
    let store = ObjectStore::new();
    store.attach::<Customer>("customer").unwrap();
    let customer = store
        .insert(Customer {
            cached_score: 7,
            ..Customer::default()
        })
        .unwrap();
    assert_eq!(customer.get().unwrap().cached_score, 7);
    assert_eq!(customer.get().unwrap().id.value(), customer.id());
}

#[test]
fn test_type_without_identifier_is_refused() {
    let store = ObjectStore::new();
    assert!(matches!(
        store.attach::<Anonymous>("anonymous"),
        Err(StoreError::MissingIdentifier(_))
    ));
}
