//! Message routing: global, portal-scoped and direct.

mod common;

use common::TestServer;
use std::time::Duration;

#[tokio::test]
async fn global_reaches_everyone_but_sender() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let mut alice = server.login("alice").await.unwrap();
    let mut bob = server.login("bob").await.unwrap();
    let mut carol = server.login("carol").await.unwrap();

    alice
        .expect("* users: alice, bob, carol (you are alice)")
        .await
        .unwrap();

    alice.send_line("@hello all").await.unwrap();
    alice.expect("> @hello all").await.unwrap();
    bob.expect("@alice : hello all").await.unwrap();
    carol.expect("@alice : hello all").await.unwrap();

    // The sender gets no copy of its own message.
    alice.assert_silent(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn portal_messages_stay_in_portal() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let mut alice = server.login("alice").await.unwrap();
    let mut bob = server.login("bob").await.unwrap();
    let mut carol = server.login("carol").await.unwrap();

    assert_eq!(alice.run("portal ops").await.unwrap(), "Portal changed to ops");
    alice
        .expect("* portals: ops (1) [current: ops]")
        .await
        .unwrap();
    assert_eq!(bob.run("portal ops").await.unwrap(), "Portal changed to ops");
    alice.expect("* users: alice, bob (you are alice)").await.unwrap();

    alice.send_line("#standup now").await.unwrap();
    bob.expect("#alice : standup now (ops)").await.unwrap();

    carol.send_line("@ping").await.unwrap();
    bob.expect("@carol : ping").await.unwrap();

    assert_eq!(
        carol.run("#anyone?").await.unwrap(),
        "* You are not currently in a portal"
    );
    assert_eq!(
        carol.run("portals").await.unwrap(),
        "Portals: ops (2)"
    );
}

#[tokio::test]
async fn leave_returns_to_lobby() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let mut alice = server.login("alice").await.unwrap();
    let mut bob = server.login("bob").await.unwrap();

    assert_eq!(alice.run("portal ops").await.unwrap(), "Portal changed to ops");
    bob.expect("* users: bob (you are bob)").await.unwrap();

    assert_eq!(alice.run("leave").await.unwrap(), "Left portal ops");
    bob.expect("* users: alice, bob (you are bob)").await.unwrap();
    assert_eq!(
        alice.run("leave").await.unwrap(),
        "You are not currently in a portal"
    );
}

#[tokio::test]
async fn direct_messages() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let mut alice = server.login("alice").await.unwrap();
    let mut bob = server.login("bob").await.unwrap();

    assert_eq!(
        alice.run("msg bob psst, over   here").await.unwrap(),
        "-> bob : psst, over   here"
    );
    bob.expect("<- alice : psst, over   here").await.unwrap();

    assert_eq!(
        alice.run("msg alice hi").await.unwrap(),
        "Cannot send message to yourself"
    );
    assert_eq!(alice.run("msg dave hi").await.unwrap(), "User dave not found");
    assert_eq!(alice.run("msg bob").await.unwrap(), "msg <target> <message>");
}

#[tokio::test]
async fn disconnect_updates_presence() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let mut alice = server.login("alice").await.unwrap();
    let bob = server.login("bob").await.unwrap();
    alice
        .expect("* users: alice, bob (you are alice)")
        .await
        .unwrap();

    drop(bob);
    alice.expect("* users: alice (you are alice)").await.unwrap();
    assert_eq!(alice.run("msg bob hi").await.unwrap(), "User bob not found");
}
