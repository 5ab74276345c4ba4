//! Photo slideshow over records that carry an image.

use crate::model::todo::Todo;

/// Number of photos from which the dashboard offers a slideshow.
pub const SLIDESHOW_MIN_PHOTOS: usize = 3;

/// Wrap-around cursor over the records with an image.
#[derive(Debug, Clone)]
pub struct Slideshow<'a> {
    slides: Vec<&'a Todo>,
    position: usize,
}

impl<'a> Slideshow<'a> {
    /// Returns `None` when no record has an image.
    pub fn new(todos: &'a [Todo]) -> Option<Self> {
        let slides = todos.iter().filter(|todo| todo.has_image()).collect::<Vec<_>>();
        if slides.is_empty() {
            return None;
        }
        Some(Self {
            slides,
            position: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always `false`; `new` refuses a collection without photos.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Zero-based index of the current slide.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> &'a Todo {
        self.slides[self.position]
    }

    pub fn advance(&mut self) -> &'a Todo {
        self.position = (self.position + 1) % self.slides.len();
        self.current()
    }

    pub fn rewind(&mut self) -> &'a Todo {
        self.position = (self.position + self.slides.len() - 1) % self.slides.len();
        self.current()
    }
}

/// Whether the dashboard should offer the slideshow.
pub fn slideshow_available(todos: &[Todo]) -> bool {
    todos.iter().filter(|todo| todo.has_image()).count() >= SLIDESHOW_MIN_PHOTOS
}
