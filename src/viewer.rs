/// Full-size carousel over the media of one publication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaViewer {
    images: Vec<String>,
    index: usize,
}

impl MediaViewer {
    pub fn open(images: Vec<String>, start: usize) -> Self {
        let index = start.min(images.len().saturating_sub(1));
        Self { images, index }
    }

    pub fn is_open(&self) -> bool {
        !self.images.is_empty()
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn current(&self) -> Option<&str> {
        self.images.get(self.index).map(String::as_str)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Wraps from the last image to the first.
    pub fn next(&mut self) {
        if !self.images.is_empty() {
            self.index = (self.index + 1) % self.images.len();
        }
    }

    /// Wraps from the first image to the last.
    pub fn prev(&mut self) {
        if !self.images.is_empty() {
            self.index = self.index.checked_sub(1).unwrap_or(self.images.len() - 1);
        }
    }

    pub fn go_to(&mut self, index: usize) {
        if index < self.images.len() {
            self.index = index;
        }
    }
}
