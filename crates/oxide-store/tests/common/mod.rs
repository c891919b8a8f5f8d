#![allow(dead_code)]

use oxide_store::{
    HasMany, HasManyList, Identifier, ObjectPtr, ObjectRef, ObjectStore, Persistent, Varchar,
};

#[derive(Debug, Default, Persistent)]
pub struct Address {
    pub id: Identifier,
    pub street: Varchar<128>,
    pub city: String,
}

#[derive(Debug, Default, Persistent)]
pub struct Person {
    pub id: Identifier,
    pub name: String,
    pub age: i32,
    pub address: ObjectPtr<Address>,
}

#[derive(Debug, Default, Persistent)]
pub struct Team {
    pub id: Identifier,
    pub name: String,
    pub members: HasMany<ObjectPtr<Person>>,
}

#[derive(Debug, Default, Persistent)]
pub struct Playlist {
    pub id: Identifier,
    pub title: String,
    pub tracks: HasManyList<String>,
}

#[derive(Debug, Default, Persistent)]
pub struct Memo {
    pub id: Identifier,
    pub text: String,
    #[persist(name = "about_id")]
    pub about: ObjectRef<Person>,
}

/// A store with every test type attached.
pub fn store() -> ObjectStore {
    let store = ObjectStore::new();
    store.attach::<Address>("address").unwrap();
    store.attach::<Person>("person").unwrap();
    store.attach::<Team>("team").unwrap();
    store.attach::<Playlist>("playlist").unwrap();
    store.attach::<Memo>("memo").unwrap();
    store
}

pub fn address(street: &str, city: &str) -> Address {
    Address {
        street: Varchar::new(street),
        city: String::from(city),
        ..Address::default()
    }
}

pub fn person(name: &str, address: ObjectPtr<Address>) -> Person {
    Person {
        name: String::from(name),
        age: 36,
        address,
        ..Person::default()
    }
}
