//! Merging a fetched friend list into the store.

use super::node::NodeId;
use super::store::NodeStore;
use crate::fetch::FriendEntry;

/// Merge `user`'s friend list and propagate shortest distances.
///
/// Edges are recorded in both directions and each friend's profile is
/// refreshed from its entry. Distances are settled in two passes: first
/// `user` is bounded by every friend's distance + 1, then every friend is
/// bounded by the settled `user` distance + 1. Running the outward pass
/// first could hand friends a distance that the same batch later improves.
///
/// Returns the ids whose distance decreased, in the order they changed.
pub fn merge_friend_list(store: &mut NodeStore, user: NodeId, friends: &[FriendEntry]) -> Vec<NodeId> {
    let mut improved = Vec::new();

    for friend in friends {
        store.add_edge(friend.uid, user);
        store.merge_profile(friend.uid, friend.profile_attrs());
        store.add_edge(user, friend.uid);

        let via_friend = store.distance(friend.uid).saturating_add(1);
        if store.set_distance(user, via_friend) {
            improved.push(user);
        }
    }

    let via_user = store.distance(user).saturating_add(1);
    for friend in friends {
        if store.set_distance(friend.uid, via_user) {
            improved.push(friend.uid);
        }
        log::info!(
            "Added friends: {} - {} ({}, {})",
            user,
            friend.uid,
            friend.display_name(),
            store.distance(friend.uid)
        );
    }

    improved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::UNKNOWN_DISTANCE;

    fn entry(id: u64, name: &str) -> FriendEntry {
        FriendEntry::new(NodeId(id), name)
    }

    #[test]
    fn test_outward_leg_sets_friend_distance() {
        let mut store = NodeStore::new();
        store.set_distance(NodeId(0), 0);
        store.set_distance(NodeId(1), 1);

        let improved = merge_friend_list(&mut store, NodeId(1), &[entry(2, "F1")]);

        assert_eq!(store.distance(NodeId(1)), 1);
        assert_eq!(store.distance(NodeId(2)), 2);
        assert_eq!(improved, vec![NodeId(2)]);
    }

    #[test]
    fn test_self_leg_uses_known_friend_distance() {
        let mut store = NodeStore::new();
        store.set_distance(NodeId(0), 0);

        // Node 9 is unknown until it turns out to be a friend of the target
        merge_friend_list(&mut store, NodeId(9), &[entry(0, "Target"), entry(4, "Other")]);

        assert_eq!(store.distance(NodeId(9)), 1);
        // Outward leg runs after the self leg has settled
        assert_eq!(store.distance(NodeId(4)), 2);
    }

    #[test]
    fn test_self_leg_settles_before_outward_leg() {
        let mut store = NodeStore::new();
        store.set_distance(NodeId(0), 0);

        // The improving friend comes last in the batch; earlier friends must
        // still receive the tightened bound.
        merge_friend_list(&mut store, NodeId(5), &[entry(6, "A"), entry(7, "B"), entry(0, "T")]);

        assert_eq!(store.distance(NodeId(5)), 1);
        assert_eq!(store.distance(NodeId(6)), 2);
        assert_eq!(store.distance(NodeId(7)), 2);
    }

    #[test]
    fn test_unreachable_user_leaves_friends_unknown() {
        let mut store = NodeStore::new();
        merge_friend_list(&mut store, NodeId(1), &[entry(2, "x")]);
        assert_eq!(store.distance(NodeId(1)), UNKNOWN_DISTANCE);
        assert_eq!(store.distance(NodeId(2)), UNKNOWN_DISTANCE);
    }

    #[test]
    fn test_edges_recorded_both_directions() {
        let mut store = NodeStore::new();
        store.set_distance(NodeId(1), 1);
        merge_friend_list(&mut store, NodeId(1), &[entry(2, "B"), entry(3, "C")]);

        assert_eq!(store.get(NodeId(1)).unwrap().friends(), &[NodeId(2), NodeId(3)]);
        assert_eq!(store.get(NodeId(2)).unwrap().friends(), &[NodeId(1)]);
        assert_eq!(store.get(NodeId(3)).unwrap().friends(), &[NodeId(1)]);
    }

    #[test]
    fn test_friend_profile_merged() {
        let mut store = NodeStore::new();
        merge_friend_list(&mut store, NodeId(1), &[entry(2, "Bea")]);
        assert_eq!(store.get(NodeId(2)).unwrap().display_name(), "Bea");
    }

    #[test]
    fn test_unnamed_entry_keeps_known_name() {
        let mut store = NodeStore::new();
        merge_friend_list(&mut store, NodeId(1), &[entry(2, "Bea")]);

        let unnamed: FriendEntry = serde_json::from_str(r#"{"uid": 2, "path": "/bea"}"#).unwrap();
        merge_friend_list(&mut store, NodeId(3), &[unnamed]);

        let node = store.get(NodeId(2)).unwrap();
        assert_eq!(node.display_name(), "Bea");
        assert_eq!(node.attr("path"), "/bea");
    }

    #[test]
    fn test_self_friend_is_noop_for_distance() {
        let mut store = NodeStore::new();
        store.set_distance(NodeId(1), 1);
        merge_friend_list(&mut store, NodeId(1), &[entry(1, "Me")]);
        assert_eq!(store.distance(NodeId(1)), 1);
        assert_eq!(store.get(NodeId(1)).unwrap().friends(), &[NodeId(1), NodeId(1)]);
    }

    #[test]
    fn test_duplicate_friend_in_batch() {
        let mut store = NodeStore::new();
        store.set_distance(NodeId(1), 1);
        let improved = merge_friend_list(&mut store, NodeId(1), &[entry(2, "B"), entry(2, "B")]);
        assert_eq!(store.distance(NodeId(2)), 2);
        assert_eq!(improved, vec![NodeId(2)]);
        assert_eq!(store.get(NodeId(2)).unwrap().friends().len(), 2);
    }

    #[test]
    fn test_back_edge_does_not_raise_distance() {
        let mut store = NodeStore::new();
        store.set_distance(NodeId(0), 0);
        store.set_distance(NodeId(1), 1);
        store.set_distance(NodeId(2), 3);

        merge_friend_list(&mut store, NodeId(2), &[entry(1, "S")]);

        assert_eq!(store.distance(NodeId(2)), 2);
        assert_eq!(store.distance(NodeId(1)), 1);
    }
}
