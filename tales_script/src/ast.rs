//! Arena-backed syntax tree for parsed scripts.
//!
//! Elements live in a single vector owned by [`Program`] and refer to each other
//! through [`ElementId`] handles. Identifiers are assigned in construction
//! order, so parsing the same source twice yields identical ids. A post-pass
//! records for every non-scene element which list it lives in, which is what
//! the interpreter uses to find successors and choice groups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to an element inside a [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u32);

impl ElementId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named container of story elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    pub content: Vec<ElementId>,
    pub line: usize,
}

/// A line of speech plus the effects applied when it is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    pub speaker: String,
    pub text: String,
    /// Raw effect expressions, in source order.
    pub effects: Vec<String>,
    pub line: usize,
}

/// A selectable option. Consecutive choices in one list form a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Number of `*` in the marker.
    pub level: usize,
    pub text: String,
    /// Raw condition expression, if the choice is gated.
    pub condition: Option<String>,
    pub effects: Vec<String>,
    /// Destination scene name.
    pub transition: Option<String>,
    pub line: usize,
}

/// `@if` / `@else` / `@endif` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfBlock {
    pub condition: String,
    pub then_branch: Vec<ElementId>,
    /// `None` when the block has no `@else`; `Some(vec![])` for an empty one.
    pub else_branch: Option<Vec<ElementId>>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    Scene(Scene),
    Dialogue(Dialogue),
    Choice(Choice),
    If(IfBlock),
}

impl Element {
    /// 1-based line the element was declared on.
    pub fn line(&self) -> usize {
        match self {
            Element::Scene(scene) => scene.line,
            Element::Dialogue(dialogue) => dialogue.line,
            Element::Choice(choice) => choice.line,
            Element::If(block) => block.line,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Scene(_) => "scene",
            Element::Dialogue(_) => "dialogue",
            Element::Choice(_) => "choice",
            Element::If(_) => "if",
        }
    }

    pub fn as_scene(&self) -> Option<&Scene> {
        match self {
            Element::Scene(scene) => Some(scene),
            _ => None,
        }
    }

    pub fn as_dialogue(&self) -> Option<&Dialogue> {
        match self {
            Element::Dialogue(dialogue) => Some(dialogue),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&Choice> {
        match self {
            Element::Choice(choice) => Some(choice),
            _ => None,
        }
    }

    pub fn as_if(&self) -> Option<&IfBlock> {
        match self {
            Element::If(block) => Some(block),
            _ => None,
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, Element::Choice(_))
    }

    pub fn is_dialogue(&self) -> bool {
        matches!(self, Element::Dialogue(_))
    }
}

/// Which child list of an owner an element sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    /// Scene content.
    Content,
    Then,
    Else,
}

/// Back-reference from an element to the list that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    pub owner: ElementId,
    pub branch: Branch,
    /// Position inside the owner's list.
    pub index: usize,
}

/// A parsed script: the element arena, the scene list, and the parent table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Program {
    elements: Vec<Element>,
    scenes: Vec<ElementId>,
    parents: Vec<Option<ParentLink>>,
}

impl Program {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store an element and hand back its id.
    pub(crate) fn alloc(&mut self, element: Element) -> ElementId {
        let raw = u32::try_from(self.elements.len()).unwrap_or(u32::MAX);
        let id = ElementId(raw);
        if let Element::Scene(_) = &element {
            self.scenes.push(id);
        }
        self.elements.push(element);
        id
    }

    pub(crate) fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.index())
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.index())
    }

    pub fn contains(&self, id: ElementId) -> bool {
        id.index() < self.elements.len()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All elements with their ids, in construction order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter().enumerate().map(|(idx, el)| (ElementId(idx as u32), el))
    }

    /// Scene ids in declaration order.
    pub fn scene_ids(&self) -> &[ElementId] {
        &self.scenes
    }

    /// Scenes in declaration order.
    pub fn scenes(&self) -> impl Iterator<Item = (ElementId, &Scene)> {
        self.scenes
            .iter()
            .filter_map(|id| self.get(*id).and_then(Element::as_scene).map(|scene| (*id, scene)))
    }

    /// Look up a scene by exact name.
    pub fn scene(&self, name: &str) -> Option<(ElementId, &Scene)> {
        self.scenes().find(|(_, scene)| scene.name == name)
    }

    /// Parent link for `id`. Scenes and unknown ids have none.
    pub fn parent(&self, id: ElementId) -> Option<ParentLink> {
        self.parents.get(id.index()).copied().flatten()
    }

    /// One of an owner's child lists.
    pub fn list(&self, owner: ElementId, branch: Branch) -> Option<&[ElementId]> {
        match (self.get(owner)?, branch) {
            (Element::Scene(scene), Branch::Content) => Some(&scene.content),
            (Element::If(block), Branch::Then) => Some(&block.then_branch),
            (Element::If(block), Branch::Else) => block.else_branch.as_deref(),
            _ => None,
        }
    }

    /// Scene an element ultimately belongs to. A scene id maps to itself.
    pub fn scene_of(&self, id: ElementId) -> Option<&Scene> {
        let mut current = id;
        while let Some(link) = self.parent(current) {
            current = link.owner;
        }
        self.get(current).and_then(Element::as_scene)
    }

    /// The list containing `id` and the element's position in it.
    pub fn owning_list(&self, id: ElementId) -> Option<(&[ElementId], usize)> {
        let link = self.parent(id)?;
        self.list(link.owner, link.branch).map(|list| (list, link.index))
    }

    /// Rebuild the parent table by walking every scene depth-first.
    pub(crate) fn link_parents(&mut self) {
        let mut parents = vec![None; self.elements.len()];
        for &scene_id in &self.scenes {
            if let Some(Element::Scene(scene)) = self.get(scene_id) {
                self.link_list(scene_id, Branch::Content, &scene.content, &mut parents);
            }
        }
        self.parents = parents;
    }

    fn link_list(
        &self,
        owner: ElementId,
        branch: Branch,
        list: &[ElementId],
        parents: &mut [Option<ParentLink>],
    ) {
        for (index, &child) in list.iter().enumerate() {
            if let Some(slot) = parents.get_mut(child.index()) {
                *slot = Some(ParentLink { owner, branch, index });
            }
            if let Some(Element::If(block)) = self.get(child) {
                self.link_list(child, Branch::Then, &block.then_branch, parents);
                if let Some(else_branch) = &block.else_branch {
                    self.link_list(child, Branch::Else, else_branch, parents);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialogue(text: &str, line: usize) -> Element {
        Element::Dialogue(Dialogue {
            speaker: "Bob".into(),
            text: text.into(),
            effects: Vec::new(),
            line,
        })
    }

    #[test]
    fn ids_follow_allocation_order() {
        let mut program = Program::new();
        let scene = program.alloc(Element::Scene(Scene {
            name: "start".into(),
            content: Vec::new(),
            line: 1,
        }));
        let line = program.alloc(dialogue("hi", 2));
        assert_eq!(scene, ElementId::new(0));
        assert_eq!(line, ElementId::new(1));
        assert_eq!(program.scene_ids(), &[scene]);
        assert_eq!(line.to_string(), "#1");
    }

    #[test]
    fn parent_links_cover_nested_branches() {
        let mut program = Program::new();
        let scene = program.alloc(Element::Scene(Scene {
            name: "start".into(),
            content: Vec::new(),
            line: 1,
        }));
        let block = program.alloc(Element::If(IfBlock {
            condition: "true".into(),
            then_branch: Vec::new(),
            else_branch: None,
            line: 2,
        }));
        let inner = program.alloc(dialogue("then", 3));
        let other = program.alloc(dialogue("else", 5));
        if let Some(Element::If(b)) = program.get_mut(block) {
            b.then_branch.push(inner);
            b.else_branch = Some(vec![other]);
        }
        if let Some(Element::Scene(s)) = program.get_mut(scene) {
            s.content.push(block);
        }
        program.link_parents();

        assert_eq!(program.parent(scene), None);
        assert_eq!(
            program.parent(block),
            Some(ParentLink {
                owner: scene,
                branch: Branch::Content,
                index: 0
            })
        );
        assert_eq!(program.parent(other).map(|p| p.branch), Some(Branch::Else));
        let (list, idx) = program.owning_list(inner).unwrap();
        assert_eq!(list, &[inner]);
        assert_eq!(idx, 0);
        assert_eq!(program.scene("start").map(|(id, _)| id), Some(scene));
        assert_eq!(program.scene_of(other).map(|s| s.name.as_str()), Some("start"));
        assert!(program.scene("missing").is_none());
    }
}
