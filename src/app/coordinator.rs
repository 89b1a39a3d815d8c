// Navigation between the listing and detail screens. Only the selected show id
// crosses from one screen to the next.

use crate::types::ShowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    Details { show_id: ShowId },
}

#[derive(Debug, Default)]
pub struct Coordinator {
    stack: Vec<Screen>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was shown with the listing screen.
    pub fn start(&mut self) {
        self.stack.clear();
        self.stack.push(Screen::Main);
        log::debug!("coordinator: showing main screen");
    }

    pub fn open_details(&mut self, show_id: ShowId) {
        log::debug!("coordinator: push details for show {}", show_id);
        self.stack.push(Screen::Details { show_id });
    }

    /// Pops the top screen. The root screen stays; returns false if there was nothing to pop.
    pub fn back(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        true
    }

    pub fn current(&self) -> Option<Screen> {
        self.stack.last().copied()
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
