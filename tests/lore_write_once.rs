//! DESCRIBE, TASTE, TOUCH and SMELL each write their attribute once.

mod common;

use common::{hub, join, send_all};
use mushgrid::mush::Attribute;

#[test]
fn seeded_room_description_is_read_only() {
    let (_tmp, mut hub) = hub();
    let alice = join(&mut hub, "Alice");
    let reply = hub.handle_input(&alice, "describe");
    assert!(reply.starts_with("Limbo has already been described:\nA grey"), "{}", reply);
    assert!(hub.session(&alice).expect("session").pending.is_none());
}

#[test]
fn new_room_can_be_described_exactly_once() {
    let (_tmp, mut hub) = hub();
    let alice = join(&mut hub, "Alice");
    send_all(&mut hub, &alice, &["explore w", "Ridge"]);

    let question = hub.handle_input(&alice, "describe here");
    assert_eq!(
        question,
        "How would you describe Ridge? Add some flavour to your description."
    );
    assert_eq!(hub.handle_input(&alice, "Wind-scoured rock."), "You describe Ridge.");

    let look = hub.handle_input(&alice, "look");
    assert!(look.contains("Wind-scoured rock."), "{}", look);

    let again = hub.handle_input(&alice, "describe");
    assert_eq!(again, "Ridge has already been described:\nWind-scoured rock.");
}

#[test]
fn second_taste_shows_the_first() {
    let (_tmp, mut hub) = hub();
    let alice = join(&mut hub, "Alice");
    send_all(&mut hub, &alice, &["get apple", "yes", "drop apple"]);

    assert_eq!(hub.handle_input(&alice, "taste apple"), "What does apple taste like?");
    assert_eq!(hub.handle_input(&alice, "Sweet and crisp."), "You note how apple tastes.");
    assert_eq!(
        hub.handle_input(&alice, "taste apple"),
        "You taste apple. Sweet and crisp."
    );

    let look = hub.handle_input(&alice, "look apple");
    assert!(look.contains("Taste: Sweet and crisp."), "{}", look);
}

#[test]
fn empty_answer_leaves_attribute_unset() {
    let (_tmp, mut hub) = hub();
    let alice = join(&mut hub, "Alice");
    send_all(&mut hub, &alice, &["get rose", "y"]);

    hub.handle_input(&alice, "smell rose");
    assert_eq!(hub.handle_input(&alice, "   "), "Nothing changed.");
    assert_eq!(hub.handle_input(&alice, "smell rose"), "What does rose smell like?");
}

#[test]
fn first_writer_wins_when_two_players_race() {
    let (_tmp, mut hub) = hub();
    let alice = join(&mut hub, "Alice");
    let bob = join(&mut hub, "Bob");
    send_all(&mut hub, &alice, &["get stone", "yes", "drop stone"]);

    assert_eq!(
        hub.handle_input(&alice, "touch stone"),
        "What does stone feel like to the touch?"
    );
    assert_eq!(
        hub.handle_input(&bob, "touch stone"),
        "What does stone feel like to the touch?"
    );

    assert_eq!(hub.handle_input(&alice, "Smooth and cold."), "You note how stone feels.");
    assert_eq!(
        hub.handle_input(&bob, "Rough."),
        "Someone got there first.\nYou touch stone. Smooth and cold."
    );

    let store = hub.processor().store();
    let room = store
        .get_room(&store.get_player(&alice).expect("alice").current_room)
        .expect("room");
    let stone = store.get_item(&room.items[0]).expect("stone");
    assert_eq!(stone.flavour.get(Attribute::Touch), Some("Smooth and cold."));
}

#[test]
fn sensing_needs_a_target() {
    let (_tmp, mut hub) = hub();
    let alice = join(&mut hub, "Alice");
    assert_eq!(hub.handle_input(&alice, "smell"), "Usage: smell <object>");
    assert_eq!(
        hub.handle_input(&alice, "taste moonbeam"),
        "You don't see 'moonbeam' here."
    );
}

#[test]
fn lore_writing_is_private() {
    let (_tmp, mut hub) = hub();
    let alice = join(&mut hub, "Alice");
    let bob = join(&mut hub, "Bob");
    send_all(&mut hub, &alice, &["explore e", "Garden", "get plum", "yes", "drop plum"]);
    hub.handle_input(&bob, "e");
    hub.drain_outbox(&bob);
    hub.drain_outbox(&alice);

    send_all(&mut hub, &alice, &["describe", "Neat rows of herbs."]);
    send_all(&mut hub, &alice, &["taste plum", "Honeyed."]);
    send_all(&mut hub, &alice, &["smell plum", "Faintly floral."]);
    assert_eq!(hub.handle_input(&alice, "taste plum"), "You taste plum. Honeyed.");

    assert!(hub.drain_outbox(&bob).is_empty());
    let look = hub.handle_input(&bob, "look plum");
    assert!(look.contains("Taste: Honeyed."), "{}", look);
}
