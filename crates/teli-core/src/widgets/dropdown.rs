/// Where a click landed, relative to the profile menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The avatar/button that opens the menu
    Activator,
    /// Anywhere inside the open menu
    Menu,
    /// Anywhere else on the page
    Outside,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDropdown {
    open: bool,
}

impl ProfileDropdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Apply a click and return the new open state
    pub fn click(&mut self, target: ClickTarget) -> bool {
        match target {
            ClickTarget::Activator => self.open = !self.open,
            ClickTarget::Menu => {}
            ClickTarget::Outside => self.open = false,
        }
        self.open
    }

    pub fn escape(&mut self) -> bool {
        self.open = false;
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropdown_transitions() {
        let mut dropdown = ProfileDropdown::new();
        assert!(!dropdown.is_open());
        assert!(dropdown.click(ClickTarget::Activator));
        assert!(dropdown.click(ClickTarget::Menu));
        assert!(!dropdown.click(ClickTarget::Outside));
        assert!(!dropdown.click(ClickTarget::Menu));
        assert!(dropdown.click(ClickTarget::Activator));
        assert!(!dropdown.click(ClickTarget::Activator));
        dropdown.click(ClickTarget::Activator);
        assert!(!dropdown.escape());
    }
}
