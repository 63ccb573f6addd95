//! In-memory ordered store of annotation elements.
//!
//! The store owns the single authoritative sequence of elements for one
//! editing session. All mutation flows through [`ElementStore::apply`] as
//! an [`ElementEvent`], giving one testable state-transition function
//! instead of ad hoc callback chains. Element order is insertion order and
//! doubles as draw order during composition; it is preserved by every
//! mutation except deletion.

use crate::elements::{AnnotationElement, ElementContent, ElementId};
use crate::geometry::{Point, Size};

/// A discrete mutation of the element store.
///
/// Events are produced by the overlay surface (drag/resize release), the
/// signature capture flow, and direct text entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    /// A new element was created and appended
    ElementCreated(AnnotationElement),
    /// An element's text or image payload was replaced
    ContentChanged {
        /// Target element
        id: ElementId,
        /// New payload
        content: ElementContent,
    },
    /// An element settled at a new position (drag release)
    ElementMoved {
        /// Target element
        id: ElementId,
        /// Settled position in screen pixels
        position: Point,
    },
    /// An element settled at a new size (resize release)
    ElementResized {
        /// Target element
        id: ElementId,
        /// Settled size in screen pixels
        size: Size,
    },
    /// An element was removed
    ElementDeleted {
        /// Target element
        id: ElementId,
    },
}

/// Insertion-ordered collection of annotation elements.
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: Vec<AnnotationElement>,
    mutations: u64,
}

impl ElementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one mutation event.
    ///
    /// Events targeting an unknown id are no-ops. Returns whether the
    /// store changed.
    pub fn apply(&mut self, event: ElementEvent) -> bool {
        let changed = match event {
            ElementEvent::ElementCreated(element) => {
                log::debug!("element {} created ({:?})", element.id, element.kind());
                self.elements.push(element);
                true
            },
            ElementEvent::ContentChanged { id, content } => self
                .with_element(id, |el| el.content = content)
                .is_some(),
            ElementEvent::ElementMoved { id, position } => self
                .with_element(id, |el| el.position = position)
                .is_some(),
            ElementEvent::ElementResized { id, size } => {
                self.with_element(id, |el| el.size = size).is_some()
            },
            ElementEvent::ElementDeleted { id } => {
                let before = self.elements.len();
                self.elements.retain(|el| el.id != id);
                self.elements.len() != before
            },
        };
        if changed {
            self.mutations += 1;
        }
        changed
    }

    /// Create an element and append it, returning its id.
    ///
    /// Defaults are filled in for a missing position or size. Content
    /// validation (empty text, unreadable image) happens when the
    /// [`ElementContent`] is constructed, before it reaches the store.
    pub fn create(
        &mut self,
        content: ElementContent,
        position: Option<Point>,
        size: Option<Size>,
        assigned_signer: impl Into<String>,
    ) -> ElementId {
        let element = AnnotationElement::new(
            content,
            position.unwrap_or(crate::elements::DEFAULT_POSITION),
            size.unwrap_or(crate::elements::DEFAULT_SIZE),
            assigned_signer,
        );
        let id = element.id;
        self.apply(ElementEvent::ElementCreated(element));
        id
    }

    /// Replace an element's payload. No-op if the id is absent.
    pub fn update_content(&mut self, id: ElementId, content: ElementContent) -> bool {
        self.apply(ElementEvent::ContentChanged { id, content })
    }

    /// Move an element to a settled position. No-op if the id is absent.
    pub fn update_position(&mut self, id: ElementId, position: Point) -> bool {
        self.apply(ElementEvent::ElementMoved { id, position })
    }

    /// Resize an element to a settled size. No-op if the id is absent.
    pub fn update_size(&mut self, id: ElementId, size: Size) -> bool {
        self.apply(ElementEvent::ElementResized { id, size })
    }

    /// Remove an element. No-op if the id is absent.
    pub fn delete(&mut self, id: ElementId) -> bool {
        self.apply(ElementEvent::ElementDeleted { id })
    }

    /// Look up an element by id.
    pub fn get(&self, id: ElementId) -> Option<&AnnotationElement> {
        self.elements.iter().find(|el| el.id == id)
    }

    /// Read-only ordered view of the current elements.
    ///
    /// This is the sequence both the display layer and the compositor
    /// consume; it always reflects the latest applied event.
    pub fn snapshot(&self) -> &[AnnotationElement] {
        &self.elements
    }

    /// Number of elements currently in the store.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the store holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Count of state-changing events applied so far.
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    fn with_element(&mut self, id: ElementId, f: impl FnOnce(&mut AnnotationElement)) -> Option<()> {
        match self.elements.iter_mut().find(|el| el.id == id) {
            Some(el) => {
                f(el);
                Some(())
            },
            None => {
                log::debug!("mutation ignored: element {} not in store", id);
                None
            },
        }
    }
}
