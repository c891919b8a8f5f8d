//! Inserting and removing object graphs: cascades, holder counts, ids and
//! relation containers.

mod common;

use common::{address, person, store, Address, Memo, Person, Playlist, Team};
use oxide_store::{
    Identifier, ObjectPtr, ObjectRef, ObjectStore, Persistent, RelationItem, StoreError,
};

#[derive(Debug, Default, Persistent)]
struct Note {
    id: Identifier,
    text: String,
    place: ObjectRef<Address>,
}

#[test]
fn test_insert_cascades_through_pointers() {
    let store = store();
    let ada = store
        .insert(person("ada", ObjectPtr::new(address("Main St 1", "London"))))
        .unwrap();

    assert_eq!(store.len(), 2);
    let home = ada.get().unwrap().address.clone();
    assert_eq!(ada.id(), 1);
    assert_eq!(home.id(), 2);
    assert_eq!(home.pointers(), 1);
    assert_eq!(ada.get().unwrap().id.value(), 1);
    assert_eq!(store.count("address"), 1);
    assert!(store.get::<Address>(home.id()).unwrap().ptr_eq(&home));
    assert!(store.get::<Person>(home.id()).is_none());

    let journal = store.journal();
    assert_eq!(journal.inserted.into_iter().collect::<Vec<_>>(), [1, 2]);
    assert!(journal.modified.is_empty());
}

#[test]
fn test_unregistered_type_changes_nothing() {
    let store = ObjectStore::new();
    store.attach::<Person>("person").unwrap();

    let result = store.insert(person("ada", ObjectPtr::new(address("Main St 1", "London"))));
    assert!(matches!(result, Err(StoreError::TypeNotRegistered(name)) if name.contains("Address")));
    assert!(store.is_empty());
    assert!(store.journal().is_empty());
}

#[test]
fn test_shared_node_counts() {
    let store = store();
    let home = ObjectPtr::new(address("Main St 1", "London"));
    let ada = store.insert(person("ada", home.clone())).unwrap();
    let bob = store.insert(person("bob", home.clone())).unwrap();
    let memo = store
        .insert(Memo {
            text: String::from("call bob"),
            about: ObjectRef::new(&bob),
            ..Memo::default()
        })
        .unwrap();

    assert_eq!(store.len(), 4);
    assert_eq!(home.pointers(), 2);
    assert_eq!(bob.references(), 1);
    assert_eq!(bob.pointers(), 0);

    assert!(matches!(
        store.remove(&home),
        Err(StoreError::StillReferenced { pointers: 2, .. })
    ));
    assert_eq!(store.len(), 4);

    store.remove(&ada).unwrap();
    assert_eq!(home.pointers(), 1);
    assert!(store.contains(home.id()));

    store.remove(&bob).unwrap();
    assert_eq!(home.pointers(), 0);
    assert!(!home.is_inserted());
    assert_eq!(memo.get().unwrap().about.id(), bob.id());
    assert_eq!(store.ids(), [memo.id()]);
}

#[test]
fn test_referenced_owned_node_blocks_parent_removal() {
    let store = store();
    store.attach::<Note>("note").unwrap();
    let ada = store
        .insert(person("ada", ObjectPtr::new(address("Main St 1", "London"))))
        .unwrap();
    let home = ada.get().unwrap().address.clone();
    let note = store
        .insert(Note {
            text: String::from("spare key under the mat"),
            place: ObjectRef::new(&home),
            ..Note::default()
        })
        .unwrap();
    assert_eq!(home.pointers(), 1);
    assert_eq!(home.references(), 1);
    let before = store.journal();

    let result = store.remove(&ada);
    assert!(matches!(
        result,
        Err(StoreError::StillReferenced { id, pointers: 1, references: 1 }) if id == home.id()
    ));
    assert_eq!(store.len(), 3);
    assert!(ada.is_inserted());
    assert_eq!(home.pointers(), 1);
    assert_eq!(store.journal(), before);

    store.remove(&note).unwrap();
    assert_eq!(home.references(), 0);
    store.remove(&ada).unwrap();
    assert!(!home.is_inserted());
    assert!(store.is_empty());
}

#[test]
fn test_removal_takes_solely_owned_nodes() {
    let store = store();
    let ada = store
        .insert(person("ada", ObjectPtr::new(address("Main St 1", "London"))))
        .unwrap();
    let home = ada.get().unwrap().address.clone();
    let (ada_id, home_id) = (ada.id(), home.id());

    store.remove(&ada).unwrap();
    assert!(store.is_empty());
    assert_eq!(home.pointers(), 0);
    let journal = store.journal();
    assert!(journal.inserted.is_empty());
    assert!(journal.removed.is_empty());

    store.insert_ptr(&ada).unwrap();
    assert_eq!((ada.id(), home.id()), (ada_id, home_id));
    assert_eq!(home.pointers(), 1);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_ids_are_never_handed_out_twice() {
    let store = store();
    let ada = store.insert(person("ada", ObjectPtr::null())).unwrap();
    let bob = store.insert(person("bob", ObjectPtr::null())).unwrap();
    store.remove(&ada).unwrap();

    let eve = store.insert(person("eve", ObjectPtr::null())).unwrap();
    assert_eq!(ada.id(), 1);
    assert_eq!(bob.id(), 2);
    assert_eq!(eve.id(), 3);
    assert!(!ada.is_inserted());

    store.insert_ptr(&ada).unwrap();
    assert_eq!(ada.id(), 1);
    assert!(ada.is_inserted());
    assert_eq!(store.ids(), [1, 2, 3]);
}

#[test]
fn test_modify_inserts_new_children() {
    let store = store();
    let ada = store.insert(person("ada", ObjectPtr::null())).unwrap();
    store.insert_ptr(&ada).unwrap();
    assert_eq!(store.len(), 1);

    ada.modify(|p| p.address = ObjectPtr::new(address("Main St 1", "London")))
        .unwrap();
    assert_eq!(store.len(), 2);
    let home = ada.get().unwrap().address.clone();
    assert_eq!(home.pointers(), 1);
    assert!(home.is_inserted());
}

#[test]
fn test_relation_items_follow_their_owner() {
    let store = store();
    let playlist = store
        .insert(Playlist {
            title: String::from("road trip"),
            ..Playlist::default()
        })
        .unwrap();
    playlist
        .modify(|p| {
            p.tracks.push(String::from("one"))?;
            p.tracks.push(String::from("two"))?;
            p.tracks.push(String::from("three"))
        })
        .unwrap()
        .unwrap();

    assert_eq!(store.len(), 4);
    assert_eq!(store.count("playlist_tracks"), 3);
    {
        let playlist = playlist.get().unwrap();
        assert!(playlist.tracks.is_attached());
        let tracks: Vec<String> = playlist.tracks.iter().map(|t| t.clone()).collect();
        assert_eq!(tracks, ["one", "two", "three"]);
    }

    store.remove(&playlist).unwrap();
    assert!(store.is_empty());
    let playlist = playlist.get().unwrap();
    assert!(!playlist.tracks.is_attached());
    assert_eq!(playlist.tracks.len(), 3);
}

#[test]
fn test_relation_pointers_block_removal() {
    let store = store();
    let ada = store.insert(person("ada", ObjectPtr::null())).unwrap();
    let team = store
        .insert(Team {
            name: String::from("core"),
            ..Team::default()
        })
        .unwrap();
    team.modify(|t| t.members.push(ada.clone())).unwrap().unwrap();

    assert_eq!(ada.pointers(), 1);
    assert!(matches!(store.remove(&ada), Err(StoreError::StillReferenced { .. })));

    team.modify(|t| t.members.clear()).unwrap().unwrap();
    assert_eq!(ada.pointers(), 0);
    assert!(!store.contains(ada.id()));
    assert_eq!(store.ids(), [team.id()]);
}

#[test]
fn test_erase_range_stops_at_first_failure() {
    let store = store();
    let playlist = store.insert(Playlist::default()).unwrap();
    playlist
        .modify(|p| {
            for track in ["a", "b", "c", "d"] {
                p.tracks.push(String::from(track))?;
            }
            Ok::<_, StoreError>(())
        })
        .unwrap()
        .unwrap();

    let positions = playlist.get().unwrap().tracks.positions();
    let third = playlist.get().unwrap().tracks.item_id(positions[2]).unwrap();
    let pinned = store.get::<RelationItem<String>>(third).unwrap();
    store.link_ptr(&pinned);

    let result = playlist.modify(|p| p.tracks.erase_range(positions[0], positions[3])).unwrap();
    assert!(matches!(result, Err(StoreError::StillReferenced { id, .. }) if id == third));

    let tracks: Vec<String> = playlist.get().unwrap().tracks.iter().map(|t| t.clone()).collect();
    assert_eq!(tracks, ["c", "d"]);
    assert_eq!(store.count("playlist_tracks"), 2);

    store.unlink_ptr(&pinned);
    playlist.modify(|p| p.tracks.clear()).unwrap().unwrap();
    assert_eq!(store.count("playlist_tracks"), 0);
}

#[test]
fn test_detach_prototype_in_use() {
    let store = store();
    store.insert(Playlist::default()).unwrap();

    assert!(matches!(store.detach("playlist"), Err(StoreError::PrototypeInUse(_))));
    assert!(matches!(store.detach("playlist_tracks"), Err(StoreError::PrototypeInUse(_))));
    assert!(matches!(store.detach("nothing"), Err(StoreError::PrototypeNotFound(_))));
    store.detach("memo").unwrap();
    assert!(store.prototype("memo").is_none());
}
