//! Human-readable score explanation trees.

/// A node in a score explanation tree: the value it contributed, a
/// description of how, and the sub-computations that fed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub value: f32,
    pub description: String,
    pub children: Vec<Explanation>,
}

impl Explanation {
    pub fn leaf(value: f32, description: impl Into<String>) -> Self {
        Explanation {
            value,
            description: description.into(),
            children: Vec::new(),
        }
    }

    pub fn combine(value: f32, description: impl Into<String>, children: Vec<Explanation>) -> Self {
        Explanation {
            value,
            description: description.into(),
            children,
        }
    }

    /// Indents children by two spaces per level.
    pub fn pretty_print(&self) -> String {
        let mut out = String::new();
        self.write_indented(&mut out, 0);
        out
    }

    fn write_indented(&self, out: &mut String, depth: usize) {
        out.push_str(&" ".repeat(depth * 2));
        out.push_str(&format!("{} = {}\n", self.value, self.description));
        for child in &self.children {
            child.write_indented(out, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_print_indents_children() {
        let explanation = Explanation::combine(
            0.5,
            "product of:",
            vec![
                Explanation::leaf(1.0, "boost"),
                Explanation::leaf(0.5, "idf"),
            ],
        );
        let printed = explanation.pretty_print();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines[0], "0.5 = product of:");
        assert_eq!(lines[1], "  1 = boost");
        assert_eq!(lines[2], "  0.5 = idf");
    }
}
