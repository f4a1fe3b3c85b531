//! Structural checks over a generated armature.

use gamerig_generate::Armature;
use gamerig_spec::DriverTarget;

/// Every structural problem found in `armature`, as readable messages.
///
/// Checks that parents exist, ancestor chains terminate, connected bones
/// have a parent, constraint subtargets resolve, driven constraints exist
/// and driver sources name an existing property.
pub fn topology_problems(armature: &Armature) -> Vec<String> {
    let mut problems = Vec::new();
    for bone in armature.bones() {
        if let Some(parent) = &bone.parent {
            if !armature.contains(parent) {
                problems.push(format!("{}: parent '{}' does not exist", bone.name, parent));
            }
        } else if bone.use_connect {
            problems.push(format!("{}: connected without a parent", bone.name));
        }
        if ancestor_chain(armature, &bone.name).is_none() {
            problems.push(format!("{}: ancestor chain loops", bone.name));
        }
        for constraint in &bone.constraints {
            if let Some(target) = &constraint.subtarget {
                if !armature.contains(target) {
                    problems.push(format!(
                        "{}: constraint '{}' targets missing bone '{}'",
                        bone.name, constraint.name, target
                    ));
                }
            }
        }
    }

    for driver in armature.drivers() {
        match &driver.target {
            DriverTarget::ConstraintInfluence { bone, constraint } => {
                let found = armature
                    .bone(bone)
                    .is_some_and(|b| b.constraints.iter().any(|c| c.name == *constraint));
                if !found {
                    problems.push(format!("driver targets missing constraint {}:{}", bone, constraint));
                }
            }
            other => {
                if !armature.contains(other.bone()) {
                    problems.push(format!("driver targets missing bone '{}'", other.bone()));
                }
            }
        }
        for var in &driver.variables {
            if armature.property(&var.source).is_none() {
                problems.push(format!("driver reads missing property {}", var.source));
            }
        }
    }
    problems
}

/// Ancestors of `name`, nearest first, or `None` if the chain loops.
pub fn ancestor_chain(armature: &Armature, name: &str) -> Option<Vec<String>> {
    let mut chain = Vec::new();
    let mut current = armature.bone(name)?.parent.clone();
    while let Some(parent) = current {
        if parent == name || chain.contains(&parent) || chain.len() > armature.len() {
            return None;
        }
        current = armature.bone(&parent).and_then(|b| b.parent.clone());
        chain.push(parent);
    }
    Some(chain)
}

/// Panics with every problem listed when `armature` is not well formed.
pub fn assert_well_formed(armature: &Armature) {
    let problems = topology_problems(armature);
    assert!(
        problems.is_empty(),
        "{} topology problem(s):\n{}",
        problems.len(),
        problems.join("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestor_chain() {
        let mut armature = Armature::new("rig");
        {
            let mut edit = armature.edit();
            edit.new_bone("a", [0.0; 3], [0.0, 0.0, 1.0]);
            edit.new_bone("b", [0.0; 3], [0.0, 0.0, 1.0]);
            edit.set_parent("b", Some("a")).unwrap();
        }
        assert!(topology_problems(&armature).is_empty());
        assert_eq!(ancestor_chain(&armature, "b"), Some(vec!["a".to_string()]));
        assert_eq!(ancestor_chain(&armature, "missing"), None);
    }
}
