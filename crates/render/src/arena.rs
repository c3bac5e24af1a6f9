//! Scene construction with stable group handles.
//!
//! While rendering, a group created early (a stacking context) keeps
//! receiving children after later siblings have been added elsewhere, so
//! groups are held in an arena and addressed by [`GroupId`]. The finished
//! tree is assembled once at the end.

use drawdom_scene::{Element, Group};
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

#[derive(Debug)]
enum Child {
    Group(GroupId),
    Leaf(Element),
}

#[derive(Debug)]
struct Slot {
    group: Group,
    children: Vec<Child>,
}

#[derive(Debug)]
pub struct SceneArena {
    slots: Vec<Slot>,
}

impl SceneArena {
    pub fn new(root: Group) -> Self {
        Self {
            slots: vec![Slot {
                group: root,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> GroupId {
        GroupId(0)
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.slots[id.0].group
    }

    pub fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.slots[id.0].group
    }

    /// Appends a non-group element.
    pub fn append(&mut self, parent: GroupId, element: impl Into<Element>) {
        let child = match element.into() {
            Element::Group(group) => Child::Group(self.alloc(group)),
            leaf => Child::Leaf(leaf),
        };
        self.slots[parent.0].children.push(child);
    }

    /// Appends a new group and returns its handle.
    pub fn append_group(&mut self, parent: GroupId, group: Group) -> GroupId {
        let id = self.alloc(group);
        self.slots[parent.0].children.push(Child::Group(id));
        id
    }

    /// Inserts a group with stacking key `key` among `parent`'s children:
    /// before the first keyed child group whose key is greater, after all
    /// others. Unkeyed children never move the insertion point.
    pub fn insert_ordered(&mut self, parent: GroupId, mut group: Group, key: f32) -> GroupId {
        group.z_order = Some(key);
        let id = self.alloc(group);
        let position = self.slots[parent.0].children.iter().position(|child| match child {
            Child::Group(other) => self.slots[other.0].group.z_order.is_some_and(|z| z > key),
            Child::Leaf(_) => false,
        });
        let children = &mut self.slots[parent.0].children;
        match position {
            Some(index) => children.insert(index, Child::Group(id)),
            None => children.push(Child::Group(id)),
        }
        id
    }

    pub fn child_count(&self, id: GroupId) -> usize {
        self.slots[id.0].children.len()
    }

    /// Assembles the finished scene under the root group.
    pub fn into_group(mut self) -> Group {
        self.assemble(GroupId(0))
    }

    fn alloc(&mut self, group: Group) -> GroupId {
        self.slots.push(Slot {
            group,
            children: Vec::new(),
        });
        GroupId(self.slots.len() - 1)
    }

    fn assemble(&mut self, id: GroupId) -> Group {
        let children = mem::take(&mut self.slots[id.0].children);
        let mut group = mem::take(&mut self.slots[id.0].group);
        for child in children {
            match child {
                Child::Group(child) => {
                    let assembled = self.assemble(child);
                    group.append(assembled);
                }
                Child::Leaf(element) => group.children.push(element),
            }
        }
        group
    }
}
