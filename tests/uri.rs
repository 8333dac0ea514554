extern crate crayon_res;

use crayon_res::res::uri::Uri;

#[test]
fn basic() {
    let uri = Uri::new("disk://textures/terrain/grass.png");
    assert_eq!(uri.url(), "disk://textures/terrain/grass.png");
    assert_eq!(uri.schema(), "disk");
    assert_eq!(uri.path(), "textures/terrain/grass.png");
    assert_eq!(uri.folder(), "textures/terrain");
    assert_eq!(uri.filename(), "grass.png");
    assert_eq!(uri.extension(), "png");
    assert_eq!(uri.url_without_file(), "disk://textures/terrain");
    assert_eq!(uri.url_without_extension(), "disk://textures/terrain/grass");
    assert!(uri.has_schema());

    let uri = Uri::new("grass.png");
    assert!(!uri.has_schema());
    assert_eq!(uri.schema(), "");
    assert_eq!(uri.path(), "grass.png");
    assert_eq!(uri.folder(), "");
    assert_eq!(uri.url_without_file(), "");
}

#[test]
fn expand() {
    let parent = Uri::new("mem://models/crate/crate.model");

    let relative = Uri::new("textures/crate.png");
    let uri = Uri::expand(&relative, &parent);
    assert_eq!(uri.url(), "mem://models/crate/textures/crate.png");
    assert_eq!(uri.schema(), parent.schema());
    assert_eq!(
        uri.url(),
        format!("{}/{}", parent.url_without_file(), relative.path())
    );
    assert_eq!(
        uri.path(),
        format!("{}/{}", parent.folder(), relative.path())
    );

    // URIs with schema are absolute already.
    let absolute = Uri::new("disk://textures/crate.png");
    assert_eq!(Uri::expand(&absolute, &parent), absolute);

    // Files at the root of a mount.
    let uri = Uri::expand(&"b.txt".into(), &"mem://a.txt".into());
    assert_eq!(uri.url(), "mem://b.txt");
    assert_eq!(uri.schema(), "mem");
    assert_eq!(uri.path(), "b.txt");
}

#[test]
fn merge() {
    let parent = Uri::new("mem://models/crate.gltf");
    let uri = Uri::merge(&parent, "mesh0");
    assert_eq!(uri.url(), "mem://models/crate#mesh0");
    assert_eq!(uri.subresource(), "mesh0");
    assert_eq!(uri.schema(), "mem");
    assert_eq!(uri.folder(), "models");
    assert_eq!(uri.extension(), "");

    let uri = Uri::merge(&"mem://models/crate".into(), "mesh0");
    assert_eq!(uri.url(), "mem://models/crate#mesh0");
}

#[test]
fn deterministic() {
    let parent = Uri::new("mem://models/crate.model");
    for _ in 0..16 {
        assert_eq!(
            Uri::expand(&"crate.png".into(), &parent),
            Uri::expand(&"crate.png".into(), &parent)
        );

        assert_eq!(Uri::merge(&parent, "a"), Uri::merge(&parent, "a"));
    }
}
