use blog_backend::error::BlogError;
use blog_backend::helper::blog_helpers::ContentStore;
use blog_backend::models::db_operations::{
    open_repository, MarkdownPostRepository, PostRepository, StorageBackend,
};
use blog_backend::models::{CreatePostData, Patch, PostFilters, UpdatePostData, DEFAULT_AUTHOR};
use tempfile::TempDir;

fn store(backend: StorageBackend) -> (TempDir, ContentStore) {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repository(backend, dir.path()).unwrap();
    (dir, ContentStore::new(repo))
}

fn both_backends() -> Vec<(TempDir, ContentStore)> {
    vec![store(StorageBackend::Markdown), store(StorageBackend::Redb)]
}

fn draft(title: &str) -> CreatePostData {
    CreatePostData {
        title: Some(title.to_string()),
        content: Some("Some words for the body.".to_string()),
        ..Default::default()
    }
}

#[test]
fn create_derives_slug_reading_time_and_defaults() {
    for (_dir, store) in both_backends() {
        let post = store
            .create(CreatePostData {
                title: Some("Hello World".into()),
                content: Some("word ".repeat(400)),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.reading_time, 2);
        assert_eq!(post.author, DEFAULT_AUTHOR);
        assert_eq!(post.category, "General");
        assert!(post.published);
        assert!(!post.featured);
        assert_eq!((post.views, post.likes), (0, 0));
        assert!(post.updated_at.is_none());

        let loaded = store.find("hello-world").unwrap().unwrap();
        assert_eq!(loaded, post);
        assert_eq!(store.find(&post.id).unwrap().unwrap().slug, "hello-world");
    }
}

#[test]
fn create_rejects_missing_title_or_content() {
    for (_dir, store) in both_backends() {
        let err = store
            .create(CreatePostData {
                content: Some("body".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, BlogError::Validation(_)));

        let err = store
            .create(CreatePostData {
                title: Some("Title".into()),
                content: Some("   ".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, BlogError::Validation(_)));

        assert!(store.all_posts().unwrap().is_empty());
    }
}

#[test]
fn renaming_a_post_moves_its_slug() {
    for (_dir, store) in both_backends() {
        let post = store.create(draft("Hello World")).unwrap();

        let updated = store
            .update(
                &post.id,
                UpdatePostData {
                    title: Patch::Set("Hello Again".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.slug, "hello-again");
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.published_at, post.published_at);
        assert!(store.find("hello-world").unwrap().is_none());
        assert_eq!(store.find("hello-again").unwrap().unwrap().id, post.id);
        assert_eq!(store.all_posts().unwrap().len(), 1);
    }
}

#[test]
fn update_recomputes_reading_time_and_clears_images() {
    for (_dir, store) in both_backends() {
        let post = store
            .create(CreatePostData {
                cover_image: Some("https://img.example.com/cover.png".into()),
                ..draft("Images")
            })
            .unwrap();
        assert!(post.cover_image.is_some());

        let updated = store
            .update(
                &post.id,
                UpdatePostData {
                    content: Patch::Set("word ".repeat(601)),
                    cover_image: Patch::Clear,
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.reading_time, 4);
        assert!(updated.cover_image.is_none());
        assert_eq!(updated.title, "Images");

        let reloaded = store.find(&post.id).unwrap().unwrap();
        assert!(reloaded.cover_image.is_none());
        assert_eq!(reloaded.reading_time, 4);
    }
}

#[test]
fn update_rejects_empty_title_and_unknown_ids() {
    for (_dir, store) in both_backends() {
        let post = store.create(draft("Keep Me")).unwrap();

        let err = store
            .update(
                &post.id,
                UpdatePostData {
                    title: Patch::Set("  ".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, BlogError::Validation(_)));
        assert_eq!(store.find(&post.id).unwrap().unwrap().title, "Keep Me");

        assert!(store.update("missing", UpdatePostData::default()).unwrap().is_none());
    }
}

#[test]
fn counters_accumulate() {
    for (_dir, store) in both_backends() {
        let post = store.create(draft("Counted")).unwrap();

        for _ in 0..3 {
            assert!(store.increment_views("counted").unwrap());
        }
        let mut last = None;
        for _ in 0..2 {
            last = store.toggle_like(&post.id).unwrap();
        }

        let outcome = last.unwrap();
        assert!(outcome.liked);
        assert_eq!(outcome.likes, 2);

        let post = store.find("counted").unwrap().unwrap();
        assert_eq!((post.views, post.likes), (3, 2));

        assert!(!store.increment_views("nope").unwrap());
        assert!(store.toggle_like("nope").unwrap().is_none());
    }
}

#[test]
fn delete_removes_the_post_once() {
    for (_dir, store) in both_backends() {
        let post = store.create(draft("Short Lived")).unwrap();

        assert!(store.delete(&post.id).unwrap());
        assert!(store.find("short-lived").unwrap().is_none());
        assert!(!store.delete(&post.id).unwrap());
        assert!(!store.delete("never-existed").unwrap());
    }
}

#[test]
fn listing_filters_sorts_and_paginates() {
    for (_dir, store) in both_backends() {
        let mut ids = Vec::new();
        for i in 0..5 {
            let post = store
                .create(CreatePostData {
                    published: Some(i != 2),
                    category: Some(if i % 2 == 0 { "SQL" } else { "Python" }.into()),
                    tags: Some(vec!["data".into()]),
                    ..draft(&format!("Post {}", i))
                })
                .unwrap();
            ids.push(post.id);
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let all = store.all_posts().unwrap();
        assert_eq!(all.first().unwrap().id, ids[4]);
        assert_eq!(all.last().unwrap().id, ids[0]);

        let published = PostFilters {
            published: Some(true),
            ..Default::default()
        };
        let page = store.list(&published, 1, 3).unwrap();
        assert_eq!(page.pagination.total, 4);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.posts.len(), 3);
        assert_eq!(page.posts[0].id, ids[4]);

        let second = store.list(&published, 2, 3).unwrap();
        assert_eq!(second.posts.len(), 1);
        assert_eq!(second.posts[0].id, ids[0]);

        let beyond = store.list(&published, 9, 3).unwrap();
        assert!(beyond.posts.is_empty());
        assert_eq!(beyond.pagination.total, 4);

        let sql = PostFilters {
            category: Some("sql".into()),
            published: Some(true),
            ..Default::default()
        };
        assert_eq!(store.list(&sql, 1, 10).unwrap().pagination.total, 2);
    }
}

#[test]
fn metadata_lists_distinct_sorted_values() {
    for (_dir, store) in both_backends() {
        store
            .create(CreatePostData {
                category: Some("Python".into()),
                tags: Some(vec!["pandas".into(), "etl".into()]),
                ..draft("One")
            })
            .unwrap();
        store
            .create(CreatePostData {
                category: Some("Analytics".into()),
                tags: Some(vec!["etl".into()]),
                ..draft("Two")
            })
            .unwrap();

        let metadata = store.metadata().unwrap();
        assert_eq!(metadata.categories, vec!["Analytics", "Python"]);
        assert_eq!(metadata.tags, vec!["etl", "pandas"]);
    }
}

#[test]
fn posts_survive_reopening_the_store() {
    for backend in [StorageBackend::Markdown, StorageBackend::Redb] {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = ContentStore::new(open_repository(backend, dir.path()).unwrap());
            store.create(draft("Persistent")).unwrap().id
        };

        let store = ContentStore::new(open_repository(backend, dir.path()).unwrap());
        assert_eq!(store.find("persistent").unwrap().unwrap().id, id);
    }
}

#[test]
fn delimiter_lines_in_title_or_excerpt_do_not_lose_the_post() {
    for (_dir, store) in both_backends() {
        let post = store
            .create(CreatePostData {
                excerpt: Some("line one\n+++\nline two".into()),
                ..draft("A\n+++\nB")
            })
            .unwrap();
        assert_eq!(post.slug, "a-b");

        let loaded = store.find(&post.id).unwrap().unwrap();
        assert_eq!(loaded, post);

        let updated = store
            .update(
                &post.id,
                UpdatePostData {
                    featured: Patch::Set(true),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.excerpt, "line one\n+++\nline two");
        assert!(store.delete(&post.id).unwrap());
        assert!(store.all_posts().unwrap().is_empty());
    }
}

#[test]
fn tag_author_and_featured_filters_combine() {
    for (_dir, store) in both_backends() {
        let featured_sql = store
            .create(CreatePostData {
                tags: Some(vec!["data".into(), "SQL".into()]),
                featured: Some(true),
                ..draft("Featured SQL")
            })
            .unwrap();
        store
            .create(CreatePostData {
                tags: Some(vec!["data".into()]),
                ..draft("Plain Data")
            })
            .unwrap();
        store
            .create(CreatePostData {
                tags: Some(vec!["python".into()]),
                featured: Some(true),
                ..draft("Featured Python")
            })
            .unwrap();

        let total = |filters: PostFilters| store.list(&filters, 1, 10).unwrap().pagination.total;

        assert_eq!(
            total(PostFilters {
                tag: Some("DATA".into()),
                ..Default::default()
            }),
            2
        );
        assert_eq!(
            total(PostFilters {
                author: Some(DEFAULT_AUTHOR.to_uppercase()),
                ..Default::default()
            }),
            3
        );
        assert_eq!(
            total(PostFilters {
                author: Some("Someone Else".into()),
                ..Default::default()
            }),
            0
        );
        assert_eq!(
            total(PostFilters {
                featured: Some(true),
                ..Default::default()
            }),
            2
        );
        assert_eq!(
            total(PostFilters {
                featured: Some(false),
                ..Default::default()
            }),
            1
        );

        let combined = store
            .list(
                &PostFilters {
                    tag: Some("data".into()),
                    featured: Some(true),
                    author: Some(DEFAULT_AUTHOR.to_lowercase()),
                    published: Some(true),
                    ..Default::default()
                },
                1,
                10,
            )
            .unwrap();
        assert_eq!(combined.pagination.total, 1);
        assert_eq!(combined.posts[0].id, featured_sql.id);
    }
}

#[test]
fn post_file_with_delimiter_in_excerpt_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let repo = MarkdownPostRepository::open(dir.path()).unwrap();
    let store = ContentStore::new(open_repository(StorageBackend::Markdown, dir.path()).unwrap());
    let post = store
        .create(CreatePostData {
            excerpt: Some("intro\n+++\nmore".into()),
            ..draft("Edge")
        })
        .unwrap();

    let listed = repo.list().unwrap();
    assert_eq!(listed, vec![post]);
}
