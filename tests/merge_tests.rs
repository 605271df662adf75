//! Merge engine scenarios against real files on disk.

mod common;

use common::{
    SOURCE_DEFAULT_ONLY, SOURCE_MYPROFILE2, TARGET_THREE_PROFILES, read_file, write_file,
};
use credsync_profile::{CredentialsModifier, Dialect, MergeOutcome, ProfileFile};
use tempfile::TempDir;

#[test]
fn test_update_named_profile_in_place() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = write_file(temp_dir.path(), "download", SOURCE_MYPROFILE2);
    let target = write_file(temp_dir.path(), "credentials", TARGET_THREE_PROFILES);

    let before = ProfileFile::load(&target, Dialect::Credentials).expect("load target");

    let mut modifier =
        CredentialsModifier::from_paths(&source, &target, Dialect::Credentials).expect("load");
    let outcome = modifier.run("myprofile2").expect("merge and write");
    assert_eq!(outcome, MergeOutcome::UpdatedExisting);

    let after = ProfileFile::load(&target, Dialect::Credentials).expect("reload target");
    assert_eq!(after.len(), 3, "target still has exactly three profiles");
    assert_eq!(after.get("myprofile1"), before.get("myprofile1"));
    assert_eq!(after.get("myprofile3"), before.get("myprofile3"));

    let updated = after.get("myprofile2").expect("myprofile2 present");
    assert_eq!(updated.key_id(), Some("ASIANEWPROFILE2ID"));
    assert_eq!(updated.secret_key(), Some("newprofile2secret"));
    assert_eq!(updated.session_token(), Some("newprofile2token"));
    assert_eq!(updated.region(), Some("us-east-1"), "region reclaimed");
    assert_eq!(updated.output(), Some("json"), "output reclaimed");

    let names: Vec<_> = after.iter().filter_map(|p| p.name()).collect();
    assert_eq!(names, ["myprofile1", "myprofile2", "myprofile3"]);
}

#[test]
fn test_insert_unknown_profile_from_default() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = write_file(temp_dir.path(), "download", SOURCE_DEFAULT_ONLY);
    let target = write_file(
        temp_dir.path(),
        "credentials",
        "[myprofile1]\naws_access_key_id = one\naws_secret_access_key = s1\n\n[myprofile3]\naws_access_key_id = three\naws_secret_access_key = s3\n",
    );

    let mut modifier =
        CredentialsModifier::from_paths(&source, &target, Dialect::Credentials).expect("load");
    assert_eq!(
        modifier.run("unknown_profile").expect("merge and write"),
        MergeOutcome::InsertedFromDefault
    );

    let after = ProfileFile::load(&target, Dialect::Credentials).expect("reload target");
    assert_eq!(after.len(), 3);
    assert!(after.has("myprofile1"));
    assert!(after.has("myprofile3"));
    assert!(!after.has_default(), "the default section is not copied as such");

    let inserted = after.get("unknown_profile").expect("inserted");
    let default = ProfileFile::from_text(SOURCE_DEFAULT_ONLY, Dialect::Credentials);
    let default = default.get_default().expect("default");
    assert_eq!(inserted.key_id(), default.key_id());
    assert_eq!(inserted.secret_key(), default.secret_key());
    assert_eq!(inserted.session_token(), default.session_token());

    let text = read_file(&target);
    assert!(text.ends_with("[unknown_profile]\naws_access_key_id = ASIADEFAULTID\naws_secret_access_key = defaultsecret\naws_session_token = defaulttoken\n"));
}

#[test]
fn test_update_existing_from_default_keeps_region() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = write_file(temp_dir.path(), "download", SOURCE_DEFAULT_ONLY);
    let target = write_file(temp_dir.path(), "credentials", TARGET_THREE_PROFILES);

    let mut modifier =
        CredentialsModifier::from_paths(&source, &target, Dialect::Credentials).expect("load");
    assert_eq!(
        modifier.run("myprofile2").expect("merge"),
        MergeOutcome::UpdatedFromDefault
    );

    let after = ProfileFile::load(&target, Dialect::Credentials).expect("reload");
    let p2 = after.get("myprofile2").expect("present");
    assert_eq!(p2.key_id(), Some("ASIADEFAULTID"));
    assert_eq!(p2.region(), Some("us-east-1"));
    assert_eq!(after.len(), 3);
}

#[test]
fn test_missing_target_is_created() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = write_file(temp_dir.path(), "download", SOURCE_DEFAULT_ONLY);
    let target = temp_dir.path().join("credentials");

    let mut modifier =
        CredentialsModifier::from_paths(&source, &target, Dialect::Credentials).expect("load");
    assert_eq!(
        modifier.run("fresh").expect("merge"),
        MergeOutcome::InsertedFromDefault
    );
    assert!(read_file(&target).starts_with("[fresh]\n"));
}

#[test]
fn test_no_match_still_rewrites_target() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = write_file(
        temp_dir.path(),
        "download",
        "[default]\naws_access_key_id = d\n\n[other]\naws_access_key_id = o\n",
    );
    let target = write_file(
        temp_dir.path(),
        "credentials",
        "# header comment\n[myprofile1]\naws_access_key_id = one\n",
    );

    let mut modifier =
        CredentialsModifier::from_paths(&source, &target, Dialect::Credentials).expect("load");
    assert_eq!(modifier.run("myprofile1").expect("merge"), MergeOutcome::Unchanged);

    // Lines before the first header do not survive a rewrite.
    assert_eq!(read_file(&target), "[myprofile1]\naws_access_key_id = one\n");
}

#[test]
fn test_config_dialect_headers() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = write_file(temp_dir.path(), "download", SOURCE_DEFAULT_ONLY);
    let target = write_file(
        temp_dir.path(),
        "config",
        "[default]\nregion = us-west-2\n\n[profile dev]\nregion = eu-west-1\noutput = table\n",
    );

    let mut modifier = CredentialsModifier::from_paths(
        &source,
        &target,
        Dialect::from_path(&target),
    )
    .expect("load");
    assert_eq!(modifier.run("prod").expect("merge"), MergeOutcome::InsertedFromDefault);
    assert_eq!(modifier.run("dev").expect("merge"), MergeOutcome::UpdatedFromDefault);

    let text = read_file(&target);
    assert!(text.contains("\n\n[profile prod]\naws_access_key_id = ASIADEFAULTID\n"));
    assert!(text.contains("[profile dev]\nregion = eu-west-1\noutput = table\naws_access_key_id = ASIADEFAULTID"));
    assert!(text.starts_with("[default]\nregion = us-west-2\n\n"));
}

#[test]
fn test_unusable_profile_name_does_not_corrupt_target() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = write_file(temp_dir.path(), "download", SOURCE_DEFAULT_ONLY);
    let target = write_file(temp_dir.path(), "credentials", TARGET_THREE_PROFILES);

    let mut modifier =
        CredentialsModifier::from_paths(&source, &target, Dialect::Credentials).expect("load");
    assert_eq!(
        modifier.run("my profile").expect("merge"),
        MergeOutcome::Unchanged
    );

    assert_eq!(read_file(&target), TARGET_THREE_PROFILES);
    let after = ProfileFile::load(&target, Dialect::Credentials).expect("reload");
    assert_eq!(after.len(), 3);
    assert!(after.iter().all(|p| p.other_lines().is_empty()));
}

#[test]
fn test_named_default_profile_is_not_dropped() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = write_file(temp_dir.path(), "download", SOURCE_DEFAULT_ONLY);
    let target = write_file(
        temp_dir.path(),
        "config",
        "[default]\nregion = us-west-2\n\n[profile default]\nregion = eu-west-1\n\n[profile dev]\noutput = json\n",
    );

    let mut modifier =
        CredentialsModifier::from_paths(&source, &target, Dialect::Config).expect("load");
    assert_eq!(modifier.run("dev").expect("merge"), MergeOutcome::UpdatedFromDefault);

    let after = ProfileFile::load(&target, Dialect::Config).expect("reload");
    assert_eq!(after.len(), 3);
    assert!(read_file(&target).contains("[profile default]\nregion = eu-west-1\n"));
    assert_eq!(
        after.get_default().and_then(|p| p.region()),
        Some("us-west-2")
    );
}
